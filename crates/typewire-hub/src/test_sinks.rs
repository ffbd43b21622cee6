//! In-memory transports for unit tests

use crate::error::{HubError, HubResult};
use crate::transport::{Frame, FrameSink, FrameStream};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Shared log of everything a sink was asked to write
pub(crate) type FrameLog = Arc<Mutex<Vec<Frame>>>;

/// Records every frame it receives
pub(crate) struct RecordingSink {
    pub(crate) frames: FrameLog,
}

impl RecordingSink {
    pub(crate) fn new() -> (Box<dyn FrameSink>, FrameLog) {
        let frames = FrameLog::default();
        let sink = Self {
            frames: Arc::clone(&frames),
        };
        (Box::new(sink), frames)
    }
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn send(&mut self, frame: Frame) -> HubResult<()> {
        self.frames.lock().push(frame);
        Ok(())
    }
}

/// Fails every write
pub(crate) struct FailingSink;

#[async_trait]
impl FrameSink for FailingSink {
    async fn send(&mut self, _frame: Frame) -> HubResult<()> {
        Err(HubError::Transport("connection reset by peer".into()))
    }
}

/// Fails every data frame but accepts the close frame, so tests can see
/// whether the transport was shut down
pub(crate) struct ResetSink {
    frames: FrameLog,
}

impl ResetSink {
    pub(crate) fn new() -> (Box<dyn FrameSink>, FrameLog) {
        let frames = FrameLog::default();
        let sink = Self {
            frames: Arc::clone(&frames),
        };
        (Box::new(sink), frames)
    }
}

#[async_trait]
impl FrameSink for ResetSink {
    async fn send(&mut self, frame: Frame) -> HubResult<()> {
        if frame.is_close() {
            self.frames.lock().push(frame);
            Ok(())
        } else {
            Err(HubError::Transport("connection reset by peer".into()))
        }
    }
}

/// Never finishes a write
pub(crate) struct StallingSink;

#[async_trait]
impl FrameSink for StallingSink {
    async fn send(&mut self, _frame: Frame) -> HubResult<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Inbound frames fed from a channel; ends when the sender is dropped
pub(crate) struct ChannelStream {
    rx: mpsc::UnboundedReceiver<HubResult<Frame>>,
}

impl ChannelStream {
    pub(crate) fn new() -> (mpsc::UnboundedSender<HubResult<Frame>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl FrameStream for ChannelStream {
    async fn next(&mut self) -> Option<HubResult<Frame>> {
        self.rx.recv().await
    }
}

/// Text payload of every text frame in the log
pub(crate) fn texts(log: &FrameLog) -> Vec<String> {
    log.lock()
        .iter()
        .filter_map(|frame| match frame {
            Frame::Text(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

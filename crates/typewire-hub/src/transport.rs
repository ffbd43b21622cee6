//! Raw transport seam.
//!
//! The hub does not speak any socket protocol itself. A server adapts its
//! websocket library to these traits once per accepted connection.

use crate::error::HubResult;
use async_trait::async_trait;

/// One transport-level message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

impl Frame {
    /// Whether this frame ends the connection
    pub fn is_close(&self) -> bool {
        matches!(self, Frame::Close)
    }
}

/// Outbound half of a connection
#[async_trait]
pub trait FrameSink: Send {
    /// Write one frame
    async fn send(&mut self, frame: Frame) -> HubResult<()>;

    /// Close the transport
    async fn close(&mut self) -> HubResult<()> {
        self.send(Frame::Close).await
    }
}

/// Inbound half of a connection
#[async_trait]
pub trait FrameStream: Send {
    /// Next frame, or `None` once the peer has gone away
    async fn next(&mut self) -> Option<HubResult<Frame>>;
}

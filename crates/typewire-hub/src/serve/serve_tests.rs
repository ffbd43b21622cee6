#![allow(non_snake_case)]

use super::*;
use crate::test_sinks::{ChannelStream, RecordingSink, ResetSink, texts};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Echoes every message back and counts hook calls
#[derive(Default)]
struct EchoHandler {
    connected: Notify,
    messages: Mutex<Vec<String>>,
    disconnects: AtomicUsize,
}

#[async_trait]
impl ConnectionHandler for EchoHandler {
    async fn on_connect(&self, _ctx: &ConnectionContext) -> HubResult<()> {
        self.connected.notify_one();
        Ok(())
    }

    async fn on_message(&self, ctx: &ConnectionContext, envelope: Envelope) -> HubResult<()> {
        self.messages.lock().push(envelope.kind.clone());
        ctx.send_envelope(&envelope).await
    }

    async fn on_disconnect(&self, _ctx: &ConnectionContext) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Refuses every connection
#[derive(Default)]
struct RejectingHandler {
    messages: AtomicUsize,
}

#[async_trait]
impl ConnectionHandler for RejectingHandler {
    async fn on_connect(&self, _ctx: &ConnectionContext) -> HubResult<()> {
        Err(HubError::Rejected("not allowed".into()))
    }

    async fn on_message(&self, _ctx: &ConnectionContext, _envelope: Envelope) -> HubResult<()> {
        self.messages.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails on every message with a non-fatal error
struct GrumpyHandler;

#[async_trait]
impl ConnectionHandler for GrumpyHandler {
    async fn on_message(&self, _ctx: &ConnectionContext, envelope: Envelope) -> HubResult<()> {
        Err(HubError::Rejected(format!("cannot handle {}", envelope.kind)))
    }
}

fn message(kind: &str) -> HubResult<Frame> {
    Ok(Frame::Text(format!(r#"{{"type":"{kind}","payload":null}}"#)))
}

#[tokio::test]
async fn Hub___serve___echoes_until_stream_ends() {
    let hub = Arc::new(Hub::new("/chat"));
    let handler = EchoHandler::default();
    let (sink, log) = RecordingSink::new();
    let (tx, stream) = ChannelStream::new();
    tx.send(message("join")).unwrap();
    tx.send(message("say")).unwrap();
    drop(tx);

    hub.serve(sink, stream, &handler).await.unwrap();

    assert_eq!(*handler.messages.lock(), vec!["join", "say"]);
    assert_eq!(
        texts(&log),
        vec![
            r#"{"type":"join","payload":null}"#,
            r#"{"type":"say","payload":null}"#
        ]
    );
    assert_eq!(hub.count(), 0);
    assert_eq!(handler.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn Hub___serve_close_frame___stops_reading() {
    let hub = Arc::new(Hub::new("/chat"));
    let handler = EchoHandler::default();
    let (tx, stream) = ChannelStream::new();
    tx.send(message("join")).unwrap();
    tx.send(Ok(Frame::Close)).unwrap();
    tx.send(message("ignored")).unwrap();

    hub.serve(RecordingSink::new().0, stream, &handler)
        .await
        .unwrap();

    assert_eq!(*handler.messages.lock(), vec!["join"]);
}

#[tokio::test]
async fn Hub___serve_rejected___closes_and_skips_messages() {
    let hub = Arc::new(Hub::new("/chat"));
    let handler = RejectingHandler::default();
    let (sink, log) = RecordingSink::new();
    let (tx, stream) = ChannelStream::new();
    tx.send(message("join")).unwrap();
    drop(tx);

    let result = hub.serve(sink, stream, &handler).await;

    assert!(matches!(result, Err(HubError::Rejected(reason)) if reason == "not allowed"));
    assert_eq!(*log.lock(), vec![Frame::Close]);
    assert_eq!(handler.messages.load(Ordering::SeqCst), 0);
    assert_eq!(hub.count(), 0);
}

#[tokio::test]
async fn Hub___serve_malformed_message___skipped() {
    let hub = Arc::new(Hub::new("/chat"));
    let handler = EchoHandler::default();
    let (tx, stream) = ChannelStream::new();
    tx.send(Ok(Frame::Text("{not json".into()))).unwrap();
    tx.send(Ok(Frame::Text(r#"{"payload":1}"#.into()))).unwrap();
    tx.send(message("say")).unwrap();
    drop(tx);

    hub.serve(RecordingSink::new().0, stream, &handler)
        .await
        .unwrap();

    assert_eq!(*handler.messages.lock(), vec!["say"]);
}

#[tokio::test]
async fn Hub___serve_handler_error___keeps_connection() {
    let hub = Arc::new(Hub::new("/chat"));
    let (tx, stream) = ChannelStream::new();
    tx.send(message("a")).unwrap();
    tx.send(message("b")).unwrap();
    drop(tx);

    let result = hub
        .serve(RecordingSink::new().0, stream, &GrumpyHandler)
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn Hub___serve_read_error___disconnects_with_error() {
    let hub = Arc::new(Hub::new("/chat"));
    let handler = EchoHandler::default();
    let (tx, stream) = ChannelStream::new();
    tx.send(Err(HubError::Transport("read failed".into())))
        .unwrap();

    let result = hub.serve(RecordingSink::new().0, stream, &handler).await;

    assert!(matches!(result, Err(HubError::Transport(_))));
    assert_eq!(hub.count(), 0);
    assert_eq!(handler.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn Hub___serve___connection_reachable_by_broadcast() {
    let hub = Arc::new(Hub::new("/chat"));
    let handler = Arc::new(EchoHandler::default());
    let (sink, log) = RecordingSink::new();
    let (tx, stream) = ChannelStream::new();

    let server = {
        let hub = Arc::clone(&hub);
        let handler = Arc::clone(&handler);
        tokio::spawn(async move { hub.serve(sink, stream, handler.as_ref()).await })
    };
    handler.connected.notified().await;

    hub.broadcast_envelope(&Envelope::new("news", json!("hello")))
        .await
        .unwrap();
    drop(tx);
    server.await.unwrap().unwrap();

    assert_eq!(texts(&log), vec![r#"{"type":"news","payload":"hello"}"#]);
}

#[tokio::test]
async fn Hub___serve_failed_write_on_quiet_connection___ends_reader_and_closes_transport() {
    let hub = Arc::new(Hub::new("/chat"));
    let handler = Arc::new(EchoHandler::default());
    let (sink, log) = ResetSink::new();
    // Sender stays alive: the peer never sends anything nor hangs up
    let (_tx, stream) = ChannelStream::new();

    let server = {
        let hub = Arc::clone(&hub);
        let handler = Arc::clone(&handler);
        tokio::spawn(async move { hub.serve(sink, stream, handler.as_ref()).await })
    };
    handler.connected.notified().await;

    let result = hub.broadcast(Frame::Text("tick".into())).await;

    assert!(matches!(result, Err(HubError::Transport(_))));
    let served = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("reader loop kept running after the failed write")
        .unwrap();
    assert!(served.is_ok());
    assert_eq!(hub.count(), 0);
    assert_eq!(handler.disconnects.load(Ordering::SeqCst), 1);
    assert_eq!(*log.lock(), vec![Frame::Close]);
}

#[tokio::test]
async fn Hub___serve_closed_through_hub___ends_reader() {
    let hub = Arc::new(Hub::new("/chat"));
    let handler = Arc::new(EchoHandler::default());
    let (sink, log) = RecordingSink::new();
    let (_tx, stream) = ChannelStream::new();

    let server = {
        let hub = Arc::clone(&hub);
        let handler = Arc::clone(&handler);
        tokio::spawn(async move { hub.serve(sink, stream, handler.as_ref()).await })
    };
    handler.connected.notified().await;

    hub.close(hub.ids()[0]).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("reader loop kept running after close")
        .unwrap()
        .unwrap();
    assert_eq!(handler.disconnects.load(Ordering::SeqCst), 1);
    assert_eq!(*log.lock(), vec![Frame::Close]);
}

#[tokio::test]
async fn ConnectionContext___debug___shows_id_and_endpoint() {
    struct Capture(Mutex<Option<String>>);

    #[async_trait]
    impl ConnectionHandler for Capture {
        async fn on_connect(&self, ctx: &ConnectionContext) -> HubResult<()> {
            *self.0.lock() = Some(format!("{ctx:?}"));
            Ok(())
        }

        async fn on_message(&self, _ctx: &ConnectionContext, _e: Envelope) -> HubResult<()> {
            Ok(())
        }
    }

    let hub = Arc::new(Hub::new("/chat"));
    let handler = Capture(Mutex::new(None));
    let (tx, stream) = ChannelStream::new();
    drop(tx);

    hub.serve(RecordingSink::new().0, stream, &handler)
        .await
        .unwrap();

    let debug = handler.0.lock().clone().unwrap();
    assert!(debug.contains("/chat"));
    assert!(debug.contains("Open"));
}

//! Concurrency tests for the connection hub
//!
//! Many tasks register, message, and drop connections at once on a
//! multi-threaded runtime; the hub's bookkeeping must stay consistent and
//! every healthy connection must keep receiving frames.

#![allow(non_snake_case)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use typewire_hub::prelude::*;

#[derive(Clone, Default)]
struct SharedSink {
    frames: Arc<Mutex<Vec<Frame>>>,
}

#[async_trait]
impl FrameSink for SharedSink {
    async fn send(&mut self, frame: Frame) -> HubResult<()> {
        tokio::task::yield_now().await;
        self.frames.lock().push(frame);
        Ok(())
    }
}

struct SlowSink {
    delay: Duration,
}

#[async_trait]
impl FrameSink for SlowSink {
    async fn send(&mut self, _frame: Frame) -> HubResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn Hub___concurrent_add_and_remove___count_consistent() {
    let hub = Arc::new(Hub::new("/chat"));

    let mut tasks = Vec::new();
    for i in 0..64 {
        let hub = Arc::clone(&hub);
        tasks.push(tokio::spawn(async move {
            let id = hub.add(Box::new(SharedSink::default()));
            if i % 2 == 0 {
                assert!(hub.remove(id));
            }
            id
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }

    assert_eq!(hub.count(), 32);
    let remaining = hub.ids();
    for id in remaining {
        assert!(ids.contains(&id));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn Hub___broadcast_during_churn___healthy_connections_receive_all() {
    let hub = Arc::new(Hub::new("/chat"));
    let stable = SharedSink::default();
    hub.add(Box::new(stable.clone()));

    let churn = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            for _ in 0..50 {
                let id = hub.add(Box::new(SharedSink::default()));
                tokio::task::yield_now().await;
                hub.remove(id);
            }
        })
    };

    let broadcasts = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            for i in 0..20 {
                match hub.broadcast(Frame::Text(format!("tick-{i}"))).await {
                    // A churned connection was removed after the snapshot
                    Ok(()) | Err(HubError::Closed(_)) => {}
                    Err(err) => panic!("unexpected broadcast failure: {err}"),
                }
            }
        })
    };

    churn.await.unwrap();
    broadcasts.await.unwrap();

    let frames = stable.frames.lock();
    let expected: Vec<Frame> = (0..20).map(|i| Frame::Text(format!("tick-{i}"))).collect();
    assert_eq!(*frames, expected);
    assert_eq!(hub.count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn Hub___slow_connection___bounded_by_write_deadline() {
    let hub = Arc::new(Hub::with_config(
        "/chat",
        HubConfig::new().with_write_timeout_ms(30),
    ));
    let fast = SharedSink::default();
    hub.add(Box::new(fast.clone()));
    let slow = hub.add(Box::new(SlowSink {
        delay: Duration::from_secs(30),
    }));

    let started = std::time::Instant::now();
    let result = hub.broadcast(Frame::Text("hello".into())).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(result, Err(HubError::Timeout { id, .. }) if id == slow));
    assert_eq!(fast.frames.lock().len(), 1);
    assert!(!hub.contains(slow));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn HubRegistry___concurrent_lookup___single_hub_per_path() {
    let registry = Arc::new(HubRegistry::new());

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            let hub = registry.hub("/chat");
            hub.add(Box::new(SharedSink::default()));
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.total_connections(), 16);
}

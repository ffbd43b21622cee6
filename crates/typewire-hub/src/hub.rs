//! Connection hub
//!
//! One [`Hub`] tracks the live connections of one socket endpoint. The
//! connection map sits behind a single reader-writer lock that is only held
//! for lookups, inserts, removals and snapshots; every frame write happens
//! outside it, serialized by a per-connection async mutex and bounded by the
//! configured deadline.

use crate::config::HubConfig;
use crate::envelope::Envelope;
use crate::error::{HubError, HubResult};
use crate::state::ConnectionState;
use crate::transport::{Frame, FrameSink};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// Identifier of one connection, unique across hubs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Hub-owned record of one connection
pub(crate) struct Connection {
    id: ConnectionId,
    /// Registration order, used to make broadcasts deterministic
    seq: u64,
    state: Mutex<ConnectionState>,
    /// Flips to `true` once the connection reaches `Closed`
    closed: watch::Sender<bool>,
    sink: tokio::sync::Mutex<Box<dyn FrameSink>>,
}

impl Connection {
    fn new(id: ConnectionId, seq: u64, sink: Box<dyn FrameSink>) -> Self {
        Self {
            id,
            seq,
            state: Mutex::new(ConnectionState::Connecting),
            closed: watch::Sender::new(false),
            sink: tokio::sync::Mutex::new(sink),
        }
    }

    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Apply a transition if the state machine allows it
    pub(crate) fn transition(&self, target: ConnectionState) -> bool {
        let mut state = self.state.lock();
        if state.can_transition_to(target) {
            *state = target;
            drop(state);
            if target.is_terminal() {
                self.closed.send_replace(true);
            }
            true
        } else {
            false
        }
    }

    /// Resolves once the connection has been closed, immediately if it
    /// already is
    pub(crate) async fn closed(&self) {
        let mut closed = self.closed.subscribe();
        // The sender lives as long as `self`, so this only returns once closed
        let _ = closed.wait_for(|closed| *closed).await;
    }

    /// Write one frame under the connection's write lock.
    ///
    /// The deadline covers waiting for the lock as well as the write itself.
    async fn write(&self, frame: Frame, timeout_ms: u64) -> HubResult<()> {
        if !self.state().can_send() {
            return Err(HubError::Closed(self.id));
        }
        let write = async {
            let mut sink = self.sink.lock().await;
            sink.send(frame).await
        };
        match tokio::time::timeout(Duration::from_millis(timeout_ms), write).await {
            Ok(result) => result,
            Err(_) => Err(HubError::Timeout {
                id: self.id,
                timeout_ms,
            }),
        }
    }

    async fn close_sink(&self, timeout_ms: u64) -> HubResult<()> {
        let close = async {
            let mut sink = self.sink.lock().await;
            sink.close().await
        };
        match tokio::time::timeout(Duration::from_millis(timeout_ms), close).await {
            Ok(result) => result,
            Err(_) => Err(HubError::Timeout {
                id: self.id,
                timeout_ms,
            }),
        }
    }
}

/// Registry of the live connections of one socket endpoint
pub struct Hub {
    endpoint: String,
    config: HubConfig,
    connections: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
    next_seq: AtomicU64,
}

impl Hub {
    /// Create a hub with default settings
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_config(endpoint, HubConfig::default())
    }

    pub fn with_config(endpoint: impl Into<String>, config: HubConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            config,
            connections: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Path of the endpoint this hub serves
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register an upgraded transport and return its id
    pub fn add(&self, sink: Box<dyn FrameSink>) -> ConnectionId {
        self.insert(sink).id()
    }

    pub(crate) fn insert(&self, sink: Box<dyn FrameSink>) -> Arc<Connection> {
        let id = ConnectionId::new();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let connection = Arc::new(Connection::new(id, seq, sink));
        connection.transition(ConnectionState::Open);

        self.connections.write().insert(id, Arc::clone(&connection));
        tracing::debug!(connection_id = %id, endpoint = %self.endpoint, "connection added");
        connection
    }

    /// Drop a connection from the hub.
    ///
    /// Returns `false` if it was already gone.
    pub fn remove(&self, id: ConnectionId) -> bool {
        let removed = self.connections.write().remove(&id);
        match removed {
            Some(connection) => {
                connection.transition(ConnectionState::Closed);
                tracing::debug!(connection_id = %id, endpoint = %self.endpoint, "connection removed");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().contains_key(&id)
    }

    /// State of a registered connection
    pub fn state(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.get(id).map(|connection| connection.state())
    }

    /// Number of registered connections
    pub fn count(&self) -> usize {
        self.connections.read().len()
    }

    /// Registered ids, in registration order
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.snapshot().iter().map(|c| c.id()).collect()
    }

    /// Write a frame to one connection.
    ///
    /// A failed or timed-out write disconnects the connection before the
    /// error is returned: it is removed, its transport is closed, and a
    /// reader loop serving it ends.
    pub async fn send_to(&self, id: ConnectionId, frame: Frame) -> HubResult<()> {
        let connection = self.get(id).ok_or(HubError::NotFound(id))?;
        self.deliver(&connection, frame).await
    }

    /// Write a frame to every connection.
    ///
    /// Connections are written one after another in registration order. A
    /// failure does not stop delivery to the rest; the first error is
    /// returned once every connection was attempted. A connection that
    /// started closing after the snapshot was taken reports
    /// [`HubError::Closed`] like any other failed write.
    pub async fn broadcast(&self, frame: Frame) -> HubResult<()> {
        let targets = self.snapshot();
        let mut first_error = None;
        let mut delivered = 0usize;

        for connection in &targets {
            match self.deliver(connection, frame.clone()).await {
                Ok(()) => delivered += 1,
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        tracing::trace!(
            endpoint = %self.endpoint,
            targets = targets.len(),
            delivered,
            "broadcast finished"
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Serialize an envelope and write it to one connection
    pub async fn send_envelope_to(&self, id: ConnectionId, envelope: &Envelope) -> HubResult<()> {
        self.send_to(id, envelope.to_frame()?).await
    }

    /// Serialize an envelope once and write it to every connection
    pub async fn broadcast_envelope(&self, envelope: &Envelope) -> HubResult<()> {
        self.broadcast(envelope.to_frame()?).await
    }

    /// Close one connection's transport and remove it
    pub async fn close(&self, id: ConnectionId) -> HubResult<()> {
        let connection = self.get(id).ok_or(HubError::NotFound(id))?;
        connection.transition(ConnectionState::Closing);
        let result = connection.close_sink(self.config.write_timeout_ms).await;
        self.remove(id);
        result
    }

    /// Close every connection.
    ///
    /// Close failures are logged; the connections are removed regardless.
    pub async fn close_all(&self) {
        for connection in self.snapshot() {
            if let Err(err) = self.close(connection.id()).await {
                tracing::debug!(
                    connection_id = %connection.id(),
                    endpoint = %self.endpoint,
                    error = %err,
                    "close failed"
                );
            }
        }
    }

    pub(crate) async fn deliver(&self, connection: &Connection, frame: Frame) -> HubResult<()> {
        match connection.write(frame, self.config.write_timeout_ms).await {
            Ok(()) => Ok(()),
            // Already on its way out; whoever is closing it owns the teardown
            Err(err @ HubError::Closed(_)) => Err(err),
            Err(err) => {
                self.disconnect(connection, &err).await;
                Err(err)
            }
        }
    }

    /// Remove a connection after a failed write and end its transport.
    ///
    /// Removal marks the record `Closed`, which also wakes the reader loop
    /// serving it.
    async fn disconnect(&self, connection: &Connection, reason: &HubError) {
        let id = connection.id();
        if !self.remove(id) {
            return;
        }
        tracing::warn!(
            connection_id = %id,
            endpoint = %self.endpoint,
            error = %reason,
            "write failed; connection dropped"
        );
        if let Err(err) = connection.close_sink(self.config.write_timeout_ms).await {
            tracing::debug!(
                connection_id = %id,
                endpoint = %self.endpoint,
                error = %err,
                "closing dropped connection failed"
            );
        }
    }

    fn get(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.read().get(&id).cloned()
    }

    fn snapshot(&self) -> Vec<Arc<Connection>> {
        let mut connections: Vec<Arc<Connection>> =
            self.connections.read().values().cloned().collect();
        connections.sort_by_key(|c| c.seq);
        connections
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .field("connections", &self.count())
            .finish()
    }
}

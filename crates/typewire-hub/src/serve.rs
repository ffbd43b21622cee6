//! Per-connection reader loop and handler hooks

use crate::envelope::Envelope;
use crate::error::{HubError, HubResult};
use crate::hub::{Connection, ConnectionId, Hub};
use crate::state::ConnectionState;
use crate::transport::{Frame, FrameSink, FrameStream};
use async_trait::async_trait;
use std::sync::Arc;

/// Application hooks for one socket endpoint
#[async_trait]
pub trait ConnectionHandler: Send + Sync {
    /// Called once the connection is registered.
    ///
    /// Returning an error rejects the connection: its transport is closed
    /// and it is removed before any message is read.
    async fn on_connect(&self, _ctx: &ConnectionContext) -> HubResult<()> {
        Ok(())
    }

    /// Called for every decoded inbound message
    async fn on_message(&self, ctx: &ConnectionContext, envelope: Envelope) -> HubResult<()>;

    /// Called once after the connection has left the hub
    async fn on_disconnect(&self, _ctx: &ConnectionContext) {}
}

/// Handle given to [`ConnectionHandler`] hooks
///
/// Sends through the context share the connection's write lock with hub
/// broadcasts, so the two never interleave.
#[derive(Clone)]
pub struct ConnectionContext {
    hub: Arc<Hub>,
    connection: Arc<Connection>,
}

impl ConnectionContext {
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    pub fn endpoint(&self) -> &str {
        self.hub.endpoint()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// The hub this connection belongs to
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Write a frame to this connection
    pub async fn send(&self, frame: Frame) -> HubResult<()> {
        self.hub.deliver(&self.connection, frame).await
    }

    /// Serialize an envelope and write it to this connection
    pub async fn send_envelope(&self, envelope: &Envelope) -> HubResult<()> {
        self.send(envelope.to_frame()?).await
    }

    /// Serialize an envelope and write it to every connection of the hub
    pub async fn broadcast(&self, envelope: &Envelope) -> HubResult<()> {
        self.hub.broadcast_envelope(envelope).await
    }
}

impl std::fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("id", &self.id())
            .field("endpoint", &self.endpoint())
            .field("state", &self.state())
            .finish()
    }
}

impl Hub {
    /// Register a connection and run its reader loop until it ends.
    ///
    /// The loop ends when the peer closes, the stream fails, a write to the
    /// connection fails, the connection is closed through the hub, or a
    /// handler returns a fatal error. A failed write ends the loop right away
    /// even when the peer has gone quiet. Malformed
    /// messages are logged and skipped. The connection is removed and
    /// `on_disconnect` runs before this returns.
    pub async fn serve<S, H>(
        self: &Arc<Self>,
        sink: Box<dyn FrameSink>,
        mut stream: S,
        handler: &H,
    ) -> HubResult<()>
    where
        S: FrameStream,
        H: ConnectionHandler + ?Sized,
    {
        let ctx = ConnectionContext {
            hub: Arc::clone(self),
            connection: self.insert(sink),
        };

        if let Err(err) = handler.on_connect(&ctx).await {
            tracing::info!(
                connection_id = %ctx.id(),
                endpoint = %self.endpoint(),
                error = %err,
                "connection rejected"
            );
            if let Err(close_err) = self.close(ctx.id()).await {
                tracing::debug!(connection_id = %ctx.id(), error = %close_err, "close after rejection failed");
            }
            return Err(match err {
                HubError::Rejected(_) => err,
                other => HubError::Rejected(other.to_string()),
            });
        }

        let result = read_loop(&ctx, &mut stream, handler).await;

        self.remove(ctx.id());
        match &result {
            Ok(()) => {
                tracing::debug!(connection_id = %ctx.id(), endpoint = %self.endpoint(), "connection ended")
            }
            Err(err) => tracing::info!(
                connection_id = %ctx.id(),
                endpoint = %self.endpoint(),
                error = %err,
                "connection ended with error"
            ),
        }
        handler.on_disconnect(&ctx).await;
        result
    }
}

async fn read_loop<S, H>(ctx: &ConnectionContext, stream: &mut S, handler: &H) -> HubResult<()>
where
    S: FrameStream,
    H: ConnectionHandler + ?Sized,
{
    loop {
        let next = tokio::select! {
            biased;
            () = ctx.connection.closed() => {
                tracing::debug!(connection_id = %ctx.id(), "connection closed by hub; stopping reader");
                break;
            }
            next = stream.next() => next,
        };
        let Some(next) = next else { break };
        let frame = next?;
        if frame.is_close() {
            break;
        }

        let envelope = match Envelope::from_frame(&frame) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(connection_id = %ctx.id(), error = %err, "skipping malformed message");
                continue;
            }
        };

        let kind = envelope.kind.clone();
        if let Err(err) = handler.on_message(ctx, envelope).await {
            if err.is_fatal() {
                return Err(err);
            }
            tracing::warn!(
                connection_id = %ctx.id(),
                message_type = %kind,
                error = %err,
                "message handler failed"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "serve/serve_tests.rs"]
mod serve_tests;

//! Error types for the connection hub

use crate::hub::ConnectionId;
use thiserror::Error;

/// Result type alias for hub operations
pub type HubResult<T> = Result<T, HubError>;

/// Errors raised by hub operations
///
/// Errors are per call; a failure on one connection never affects the
/// others.
#[derive(Error, Debug)]
pub enum HubError {
    /// No connection with this id is registered
    #[error("connection {0} not found")]
    NotFound(ConnectionId),

    /// A write did not finish before the deadline
    #[error("write to connection {id} timed out after {timeout_ms}ms")]
    Timeout { id: ConnectionId, timeout_ms: u64 },

    /// The connection is no longer open
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    /// The underlying transport failed
    #[error("transport error: {0}")]
    Transport(String),

    /// A connect hook refused the connection
    #[error("connection rejected: {0}")]
    Rejected(String),

    /// An envelope could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HubError {
    /// Whether the failure should take the connection down
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HubError::Timeout { .. } | HubError::Closed(_) | HubError::Transport(_)
        )
    }
}

//! Connection lifecycle state machine

use serde::{Deserialize, Serialize};

/// Lifecycle of one live connection
///
/// State transitions:
/// ```text
/// Connecting → Open → Closing → Closed
///      │         │                 ↑
///      └─────────┴─────────────────┘ (transport error, peer close)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Transport accepted, handshake not finished
    #[default]
    Connecting,
    /// Handshake finished; frames may be written
    Open,
    /// Local side asked to close
    Closing,
    /// Connection is gone
    Closed,
}

impl ConnectionState {
    /// Check if this state can transition to the target state
    pub fn can_transition_to(&self, target: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Connecting, Open)
                | (Open, Closing)
                // Errors and peer close skip straight to the end
                | (Connecting, Closed)
                | (Open, Closed)
                | (Closing, Closed)
        )
    }

    /// Check if frames may be written in this state
    pub fn can_send(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Check if the connection is in its terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connection is completing its handshake",
            ConnectionState::Open => "Connection is open",
            ConnectionState::Closing => "Connection is closing",
            ConnectionState::Closed => "Connection is closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Open => write!(f, "Open"),
            ConnectionState::Closing => write!(f, "Closing"),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}

//! Hub configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Deadline for a single frame write, in milliseconds
    #[serde(default = "default_write_timeout")]
    pub write_timeout_ms: u64,
}

fn default_write_timeout() -> u64 {
    5000
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            write_timeout_ms: default_write_timeout(),
        }
    }
}

impl HubConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write deadline
    pub fn with_write_timeout_ms(mut self, ms: u64) -> Self {
        self.write_timeout_ms = ms;
        self
    }

    /// Write deadline as a [`Duration`]
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

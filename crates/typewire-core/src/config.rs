//! Generator configuration types

use crate::{GenError, GenResult};
use serde::{Deserialize, Serialize};

/// How 64-bit integers are represented in generated code
///
/// Read once per generation run and applied uniformly to every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Int64Mode {
    /// Plain `number`; values above 2^53 lose precision on the client
    #[default]
    Number,
    /// Decimal `string`, for servers that encode wide integers as strings
    String,
}

/// Settings for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Prefix joined in front of every endpoint path (e.g. `/api`)
    #[serde(default)]
    pub base_path: String,

    /// Numeric fidelity for 64-bit integers
    #[serde(default)]
    pub int64: Int64Mode,

    /// Move shared type definitions into a separate artifact
    #[serde(default = "default_unified")]
    pub unified: bool,

    /// File name of the HTTP client artifact
    #[serde(default = "default_http_file")]
    pub http_file: String,

    /// File name of the socket client artifact
    #[serde(default = "default_socket_file")]
    pub socket_file: String,

    /// File name of the shared definitions artifact
    #[serde(default = "default_shared_file")]
    pub shared_file: String,

    /// Comment placed at the top of every artifact
    #[serde(default = "default_banner")]
    pub banner: String,

    /// External formatter command; the file path is appended as last argument
    /// and the text is piped through stdin
    #[serde(default)]
    pub formatter: Option<Vec<String>>,

    /// How long the formatter may run per artifact before it is killed
    #[serde(default = "default_formatter_timeout_ms")]
    pub formatter_timeout_ms: u64,
}

fn default_unified() -> bool {
    true
}

fn default_http_file() -> String {
    "http.ts".to_string()
}

fn default_socket_file() -> String {
    "socket.ts".to_string()
}

fn default_shared_file() -> String {
    "shared.ts".to_string()
}

fn default_formatter_timeout_ms() -> u64 {
    30_000
}

fn default_banner() -> String {
    "Code generated by typewire. DO NOT EDIT.".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            int64: Int64Mode::default(),
            unified: default_unified(),
            http_file: default_http_file(),
            socket_file: default_socket_file(),
            shared_file: default_shared_file(),
            banner: default_banner(),
            formatter: None,
            formatter_timeout_ms: default_formatter_timeout_ms(),
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_int64(mut self, mode: Int64Mode) -> Self {
        self.int64 = mode;
        self
    }

    pub fn with_unified(mut self, unified: bool) -> Self {
        self.unified = unified;
        self
    }

    /// Check the configuration for values generation cannot work with
    pub fn validate(&self) -> GenResult<()> {
        let files = [
            ("http_file", &self.http_file),
            ("socket_file", &self.socket_file),
            ("shared_file", &self.shared_file),
        ];

        for (key, value) in files {
            if value.trim().is_empty() {
                return Err(GenError::Config(format!("{key} cannot be empty")));
            }
        }

        for (i, (key_a, a)) in files.iter().enumerate() {
            for (key_b, b) in &files[i + 1..] {
                if a == b {
                    return Err(GenError::Config(format!(
                        "{key_a} and {key_b} both point to `{a}`"
                    )));
                }
            }
        }

        if let Some(cmd) = &self.formatter {
            if cmd.is_empty() {
                return Err(GenError::Config("formatter command is empty".into()));
            }
        }

        if self.formatter_timeout_ms == 0 {
            return Err(GenError::Config(
                "formatter_timeout_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Base path with a leading slash and no trailing slash, or empty
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Join the base path and an endpoint path
    pub fn full_path(&self, path: &str) -> String {
        let path = path.trim();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        format!("{}{}", self.normalized_base_path(), path)
    }

    /// Module specifier call-site artifacts use to import shared definitions
    pub fn shared_module(&self) -> String {
        let stem = [".d.ts", ".ts", ".mts", ".tsx"]
            .iter()
            .find_map(|ext| self.shared_file.strip_suffix(ext))
            .unwrap_or(&self.shared_file);
        format!("./{stem}")
    }
}

#[cfg(test)]
#[path = "config/config_tests.rs"]
mod config_tests;

//! Socket message envelope

use crate::error::{HubError, HubResult};
use crate::transport::Frame;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Wire envelope shared by every socket message
///
/// Serializes as `{ "type": "...", "payload": ... }`, the shape the generated
/// socket clients dispatch on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message discriminator (e.g., "join", "chat.say")
    #[serde(rename = "type")]
    pub kind: String,

    /// Message payload; `null` when absent on the wire
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Envelope {
    /// Create a new envelope
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Create from a discriminator and a serializable payload
    pub fn from_typed<T: Serialize>(
        kind: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(kind, serde_json::to_value(payload)?))
    }

    /// Check the discriminator
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Deserialize the payload to a typed value
    ///
    /// This method deserializes directly from the JSON value without cloning.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Serialize to a JSON string
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encode as a text frame
    pub fn to_frame(&self) -> HubResult<Frame> {
        Ok(Frame::Text(self.to_text()?))
    }

    /// Decode a data frame.
    ///
    /// Close frames carry no envelope and yield [`HubError::Transport`].
    pub fn from_frame(frame: &Frame) -> HubResult<Self> {
        match frame {
            Frame::Text(text) => Ok(Self::from_text(text)?),
            Frame::Binary(data) => Ok(Self::from_bytes(data)?),
            Frame::Close => Err(HubError::Transport("close frame has no envelope".into())),
        }
    }
}

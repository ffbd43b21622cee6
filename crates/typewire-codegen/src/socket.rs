//! Socket endpoint model and client synthesis.
//!
//! A socket endpoint exchanges JSON envelopes `{ type, payload }`. When the
//! endpoint declares message types, every type needs a payload in both
//! directions and the generated client gets typed `on<Type>`,
//! `on<Type>Payload`, and `send<Type>` methods. Endpoints without message
//! types get a metadata object and a plain connection factory.

mod extract;
mod synth;

pub use extract::{extract_socket_endpoint, extract_socket_endpoints};
pub use synth::{RUNTIME_NAMES, SocketSynthesizer};

use std::collections::BTreeMap;
use typewire_core::TypeDescriptor;

/// A socket endpoint as declared, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct RawSocketEndpoint {
    pub name: String,
    pub path: String,
    pub description: Option<String>,
    /// Envelope type the client sends
    pub client_message: TypeDescriptor,
    /// Envelope type the server sends
    pub server_message: TypeDescriptor,
    /// Declared message type tags, in declaration order
    pub message_types: Vec<String>,
    pub client_payloads: BTreeMap<String, TypeDescriptor>,
    pub server_payloads: BTreeMap<String, TypeDescriptor>,
}

impl RawSocketEndpoint {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        client_message: TypeDescriptor,
        server_message: TypeDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: None,
            client_message,
            server_message,
            message_types: Vec::new(),
            client_payloads: BTreeMap::new(),
            server_payloads: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a message type with its payload in both directions
    pub fn with_message(
        mut self,
        tag: impl Into<String>,
        client_payload: TypeDescriptor,
        server_payload: TypeDescriptor,
    ) -> Self {
        let tag = tag.into();
        self.client_payloads.insert(tag.clone(), client_payload);
        self.server_payloads.insert(tag.clone(), server_payload);
        self.message_types.push(tag);
        self
    }
}

/// A validated message type
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDescriptor {
    pub tag: String,
    /// PascalCase suffix of the generated methods
    pub suffix: String,
    pub client_payload: TypeDescriptor,
    pub server_payload: TypeDescriptor,
}

/// A validated socket endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct SocketEndpointDescriptor {
    pub name: String,
    pub path: String,
    pub full_path: String,
    pub docs: Vec<String>,
    pub client_message: TypeDescriptor,
    pub server_message: TypeDescriptor,
    pub messages: Vec<MessageDescriptor>,
}

impl SocketEndpointDescriptor {
    pub fn is_typed(&self) -> bool {
        !self.messages.is_empty()
    }
}

#[cfg(test)]
#[path = "socket/socket_tests.rs"]
mod socket_tests;

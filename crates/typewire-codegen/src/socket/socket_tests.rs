#![allow(non_snake_case)]

use super::*;
use typewire_core::NamedType;

fn envelope(name: &str) -> TypeDescriptor {
    TypeDescriptor::named(NamedType::new("ws", name, Vec::new()))
}

#[test]
fn with_message___records_tag_and_both_payloads() {
    let raw = RawSocketEndpoint::new("chat", "/ws", envelope("In"), envelope("Out"))
        .with_message("join", TypeDescriptor::string(), TypeDescriptor::string())
        .with_message("leave", TypeDescriptor::string(), TypeDescriptor::string());

    assert_eq!(raw.message_types, vec!["join", "leave"]);
    assert!(raw.client_payloads.contains_key("leave"));
    assert!(raw.server_payloads.contains_key("join"));
}

#[test]
fn is_typed___depends_on_messages() {
    let descriptor = SocketEndpointDescriptor {
        name: "feed".into(),
        path: "/feed".into(),
        full_path: "/feed".into(),
        docs: Vec::new(),
        client_message: envelope("In"),
        server_message: envelope("Out"),
        messages: Vec::new(),
    };

    assert!(!descriptor.is_typed());
}

//! Socket endpoint validation.

use super::{MessageDescriptor, RawSocketEndpoint, SocketEndpointDescriptor};
use crate::union::validate_descriptor;
use std::collections::{BTreeMap, HashMap, HashSet};
use typewire_core::naming::{is_identifier, to_method_suffix};
use typewire_core::{
    Direction, EndpointRef, GenError, GenResult, GeneratorConfig, TypeDescriptor,
};

/// Suffixes that would shadow members of the socket base class
const BASE_MEMBER_SUFFIXES: &[&str] = &["Message", "Open", "Close", "Error", "Type", "Payload"];

/// Validate every socket endpoint, failing on the first inconsistency
pub fn extract_socket_endpoints(
    raws: &[RawSocketEndpoint],
    config: &GeneratorConfig,
) -> GenResult<Vec<SocketEndpointDescriptor>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raws.len());
    for (index, raw) in raws.iter().enumerate() {
        let endpoint = extract_socket_endpoint(index, raw, config)?;
        if !seen.insert(endpoint.name.clone()) {
            return Err(GenError::DuplicateEndpoint(endpoint.name.clone())
                .in_endpoint(EndpointRef::socket(index, &raw.name)));
        }
        out.push(endpoint);
    }
    Ok(out)
}

/// Validate one socket endpoint
///
/// Errors are wrapped with the endpoint's index and name.
pub fn extract_socket_endpoint(
    index: usize,
    raw: &RawSocketEndpoint,
    config: &GeneratorConfig,
) -> GenResult<SocketEndpointDescriptor> {
    extract_inner(raw, config).map_err(|e| e.in_endpoint(EndpointRef::socket(index, &raw.name)))
}

fn extract_inner(
    raw: &RawSocketEndpoint,
    config: &GeneratorConfig,
) -> GenResult<SocketEndpointDescriptor> {
    if !is_identifier(&raw.name) {
        return Err(GenError::InvalidName(raw.name.clone()));
    }
    if raw.path.trim().is_empty() {
        return Err(GenError::EmptyPath);
    }

    require_named("client envelope", &raw.client_message)?;
    require_named("server envelope", &raw.server_message)?;

    let mut declared = HashSet::new();
    for tag in &raw.message_types {
        if !declared.insert(tag.as_str()) {
            return Err(GenError::DuplicateMessageType(tag.clone()));
        }
    }

    let mut messages = Vec::with_capacity(raw.message_types.len());
    for tag in &raw.message_types {
        let client_payload = payload(&raw.client_payloads, tag, Direction::Client)?;
        let server_payload = payload(&raw.server_payloads, tag, Direction::Server)?;
        messages.push(MessageDescriptor {
            tag: tag.clone(),
            suffix: method_suffix(tag),
            client_payload: client_payload.clone(),
            server_payload: server_payload.clone(),
        });
    }

    warn_undeclared(&raw.name, &raw.client_payloads, &declared, Direction::Client);
    warn_undeclared(&raw.name, &raw.server_payloads, &declared, Direction::Server);

    check_method_names(&messages)?;

    validate_descriptor(&raw.client_message, config.int64)?;
    validate_descriptor(&raw.server_message, config.int64)?;
    for message in &messages {
        validate_descriptor(&message.client_payload, config.int64)?;
        validate_descriptor(&message.server_payload, config.int64)?;
    }

    Ok(SocketEndpointDescriptor {
        name: raw.name.clone(),
        path: raw.path.trim().to_string(),
        full_path: config.full_path(&raw.path),
        docs: raw
            .description
            .as_deref()
            .map(|d| d.lines().map(|l| l.trim().to_string()).collect())
            .unwrap_or_default(),
        client_message: raw.client_message.clone(),
        server_message: raw.server_message.clone(),
        messages,
    })
}

fn require_named(target: &str, ty: &TypeDescriptor) -> GenResult<()> {
    match ty {
        TypeDescriptor::Named(_) => Ok(()),
        other => Err(GenError::Resolution(format!(
            "{target} must be a named type, found {}",
            other.describe()
        ))),
    }
}

fn payload<'a>(
    payloads: &'a BTreeMap<String, TypeDescriptor>,
    tag: &str,
    direction: Direction,
) -> GenResult<&'a TypeDescriptor> {
    payloads.get(tag).ok_or_else(|| GenError::MissingPayload {
        message_type: tag.to_string(),
        direction,
    })
}

fn warn_undeclared(
    endpoint: &str,
    payloads: &BTreeMap<String, TypeDescriptor>,
    declared: &HashSet<&str>,
    direction: Direction,
) {
    for tag in payloads.keys() {
        if !declared.contains(tag.as_str()) {
            tracing::warn!(
                endpoint = %endpoint,
                message_type = %tag,
                direction = %direction,
                "ignoring payload for undeclared message type"
            );
        }
    }
}

/// Method suffix for a tag, moved off names the base class already uses
fn method_suffix(tag: &str) -> String {
    let suffix = to_method_suffix(tag);
    if BASE_MEMBER_SUFFIXES.contains(&suffix.as_str()) {
        format!("{suffix}Event")
    } else {
        suffix
    }
}

/// Every generated method name must belong to exactly one message type
fn check_method_names(messages: &[MessageDescriptor]) -> GenResult<()> {
    let mut owners: HashMap<String, &MessageDescriptor> = HashMap::new();
    for message in messages {
        let names = [
            format!("on{}", message.suffix),
            format!("on{}Payload", message.suffix),
            format!("send{}", message.suffix),
        ];
        for name in names {
            if let Some(first) = owners.get(&name) {
                return Err(GenError::MethodNameCollision {
                    first: first.tag.clone(),
                    second: message.tag.clone(),
                    suffix: message.suffix.clone(),
                });
            }
            owners.insert(name, message);
        }
    }
    Ok(())
}

//! Generation driver.
//!
//! Runs every stage in memory. Nothing is returned unless every endpoint
//! validated and every artifact rendered, so a failed run never leaves
//! partial output behind.

use crate::artifact::Artifact;
use crate::http::{self, HttpSynthesizer, RawEndpoint, extract_endpoints};
use crate::registry::NameTable;
use crate::socket::{self, RawSocketEndpoint, SocketSynthesizer, extract_socket_endpoints};
use crate::unify::merge_all;
use typewire_core::{GenResult, GeneratorConfig};

/// Raw endpoint declarations for one generation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationInput {
    pub http: Vec<RawEndpoint>,
    pub sockets: Vec<RawSocketEndpoint>,
}

impl GenerationInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http(mut self, endpoint: RawEndpoint) -> Self {
        self.http.push(endpoint);
        self
    }

    pub fn with_socket(mut self, endpoint: RawSocketEndpoint) -> Self {
        self.sockets.push(endpoint);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.http.is_empty() && self.sockets.is_empty()
    }
}

/// Generate every artifact for the input.
///
/// Artifacts come back in a fixed order: HTTP, socket, then shared when the
/// unified export is enabled. A family with no endpoints produces no file.
pub fn generate(input: &GenerationInput, config: &GeneratorConfig) -> GenResult<Vec<Artifact>> {
    config.validate()?;

    let http_endpoints = extract_endpoints(&input.http, config)?;
    let socket_endpoints = extract_socket_endpoints(&input.sockets, config)?;

    // Both files may end up importing from one shared module, so every
    // top-level name either side declares is off limits to both registries.
    let mut reserved: Vec<String> = http::RUNTIME_NAMES
        .iter()
        .chain(socket::RUNTIME_NAMES)
        .map(|name| name.to_string())
        .collect();
    reserved.extend(HttpSynthesizer::unit_names(&http_endpoints));
    reserved.extend(SocketSynthesizer::unit_names(&socket_endpoints));

    // In a unified export both registries feed one module, so the socket
    // side continues from the names the HTTP side handed out: the same type
    // keeps its name, a different type with the same name gets a suffix.
    let mut names = NameTable::new();
    let mut artifacts = Vec::with_capacity(3);
    if !http_endpoints.is_empty() {
        let mut synth = HttpSynthesizer::new(config);
        synth.reserve(reserved.iter().cloned());
        let (artifact, allocated) = synth.synthesize_with_names(&http_endpoints)?;
        if config.unified {
            names = allocated;
        }
        artifacts.push(artifact);
    }
    if !socket_endpoints.is_empty() {
        let mut synth = SocketSynthesizer::new(config).with_names(names);
        synth.reserve(reserved.iter().cloned());
        artifacts.push(synth.synthesize(&socket_endpoints)?);
    }

    if artifacts.is_empty() {
        tracing::warn!("no endpoints declared; nothing to generate");
        return Ok(artifacts);
    }

    let artifacts = if config.unified {
        let refs: Vec<&Artifact> = artifacts.iter().collect();
        let (mut call_sites, shared) = merge_all(&refs, config)?;
        call_sites.push(shared);
        call_sites
    } else {
        artifacts
    };

    tracing::info!(
        http = http_endpoints.len(),
        sockets = socket_endpoints.len(),
        files = artifacts.len(),
        unified = config.unified,
        "generation complete"
    );

    Ok(artifacts)
}

#[cfg(test)]
#[path = "generate/generate_tests.rs"]
mod generate_tests;

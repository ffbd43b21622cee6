//! # typewire
//!
//! Typed TypeScript clients for Rust HTTP and socket endpoints.
//!
//! typewire reads the serde types behind your endpoints and emits:
//! - an HTTP client with one typed call wrapper per endpoint
//! - a socket client with typed `on…`/`send…` methods per message type
//! - runtime validators for every generated interface
//! - a shared module holding definitions both clients use
//!
//! On the server side, [`Hub`] tracks the live connections of one socket
//! endpoint and sends the same `{ type, payload }` envelopes the generated
//! socket client dispatches on.
//!
//! ## Generating a Client
//!
//! ```
//! use typewire::prelude::*;
//!
//! let mut sources = SourceSet::new();
//! sources
//!     .add_source(
//!         "api",
//!         r#"
//!         #[derive(Serialize, Deserialize)]
//!         pub struct Person { pub name: String }
//!         "#,
//!     )
//!     .unwrap();
//!
//! let input = GenerationInput::new().with_http(
//!     RawEndpoint::new("getPerson", "GET", "/person")
//!         .with_response(200, Some(sources.resolve_named("Person").unwrap())),
//! );
//! let artifacts = generate(&input, &GeneratorConfig::default()).unwrap();
//!
//! assert_eq!(artifacts[0].file_name, "http.ts");
//! ```
//!
//! ## Serving a Socket Endpoint
//!
//! ```ignore
//! use typewire::prelude::*;
//!
//! struct Chat;
//!
//! #[async_trait]
//! impl ConnectionHandler for Chat {
//!     async fn on_message(&self, ctx: &ConnectionContext, envelope: Envelope) -> HubResult<()> {
//!         if envelope.is("say") {
//!             ctx.broadcast(&envelope).await?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! // Per accepted websocket, after adapting it to FrameSink/FrameStream:
//! let hub = registry.hub("/ws/chat");
//! hub.serve(sink, stream, &Chat).await?;
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`typewire_core`] - Descriptor model, errors, and configuration
//! - [`typewire_codegen`] - Registry, synthesizers, and the unified export pass
//! - [`typewire_hub`] - Connection hub and socket envelope

// Re-export core types
pub use typewire_core::{
    FieldDescriptor, GenError, GenResult, GeneratorConfig, Int64Mode, NamedType, PrimitiveKind,
    TypeDescriptor, UnionConstraint,
};

// Re-export generator entry points
pub use typewire_codegen::{
    Artifact, CommandFormatter, Formatter, GenerationInput, SourceSet, format_artifacts, generate,
    write_artifacts,
};

// Re-export hub types
pub use typewire_hub::{
    ConnectionContext, ConnectionHandler, ConnectionId, ConnectionState, Envelope, Frame,
    FrameSink, FrameStream, Hub, HubConfig, HubError, HubRegistry, HubResult,
};

// Re-export common dependencies that server authors need
pub use async_trait::async_trait;
pub use serde;
pub use serde_json;

/// Endpoint declaration types
pub mod endpoints {
    pub use typewire_codegen::http::{ContentKind, HttpMethod, RawEndpoint, RawResponse};
    pub use typewire_codegen::socket::RawSocketEndpoint;
}

/// Prelude module for convenient imports.
///
/// Use `use typewire::prelude::*;` to import commonly used types.
pub mod prelude {
    // Generation
    pub use crate::endpoints::{ContentKind, RawEndpoint, RawSocketEndpoint};
    pub use crate::{
        Artifact, GenError, GenResult, GenerationInput, GeneratorConfig, Int64Mode, SourceSet,
        generate, write_artifacts,
    };

    // Hub
    pub use crate::{
        ConnectionContext, ConnectionHandler, ConnectionId, Envelope, Frame, FrameSink,
        FrameStream, Hub, HubConfig, HubError, HubRegistry, HubResult, async_trait,
    };

    // Serde derives (commonly needed for payload types)
    pub use serde::{Deserialize, Serialize};
}

//! typewire-codegen - TypeScript client synthesis
//!
//! Turns endpoint declarations into TypeScript clients: typed interfaces,
//! runtime validators, HTTP call wrappers, and event-dispatching socket
//! clients.
//!
//! # Architecture
//!
//! ```text
//! Rust source / manifest
//!     ↓
//!  [source]        → TypeDescriptor
//!     ↓
//!  [http::extract, socket::extract]   validation, all-or-nothing
//!     ↓
//!  [registry + union + validate]      one registry per artifact
//!     ↓
//!  ├─→ [http::synth]   → http.ts
//!  └─→ [socket::synth] → socket.ts
//!     ↓
//!  [unify]         → shared.ts + import wiring
//!     ↓
//!  [output]        optional formatter, then files
//! ```
//!
//! # Usage
//!
//! ```
//! use typewire_codegen::prelude::*;
//! use typewire_core::{FieldDescriptor, NamedType, TypeDescriptor};
//!
//! let person = TypeDescriptor::named(NamedType::new(
//!     "api",
//!     "Person",
//!     vec![FieldDescriptor::new("name", TypeDescriptor::string())],
//! ));
//! let input = GenerationInput::new().with_http(
//!     RawEndpoint::new("getPerson", "GET", "/person").with_response(200, Some(person)),
//! );
//!
//! let artifacts = generate(&input, &GeneratorConfig::default()).unwrap();
//! assert_eq!(artifacts.len(), 2);
//! assert!(artifacts[1].contents.contains("export interface Person {"));
//! ```

mod artifact;
mod generate;
pub mod http;
mod output;
pub mod registry;
pub mod socket;
pub mod source;
pub mod ts;
pub mod union;
pub mod unify;
pub mod validate;

pub use artifact::{Artifact, REGION_END, REGION_START};
pub use generate::{GenerationInput, generate};
pub use output::{
    CommandFormatter, DEFAULT_FORMATTER_TIMEOUT, Formatter, format_artifacts, write_artifacts,
};
pub use source::SourceSet;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::http::{ContentKind, HttpMethod, RawEndpoint};
    pub use crate::socket::RawSocketEndpoint;
    pub use crate::{
        Artifact, CommandFormatter, Formatter, GenerationInput, SourceSet, format_artifacts,
        generate, write_artifacts,
    };
    pub use typewire_core::{GenError, GenResult, GeneratorConfig, Int64Mode};
}

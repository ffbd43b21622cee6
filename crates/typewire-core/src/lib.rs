//! typewire-core - Descriptor model, errors, and configuration
//!
//! This crate provides the foundational types shared by the typewire generator
//! and its command-line front end:
//! - [`TypeDescriptor`] and friends, the closed model of a server-side data shape
//! - [`GenError`] for generation failures
//! - [`GeneratorConfig`] for generation settings
//! - [`naming`] helpers for identifier conversion

mod config;
mod descriptor;
mod error;
pub mod naming;

pub use config::{GeneratorConfig, Int64Mode};
pub use descriptor::{
    FieldDescriptor, LiteralKind, NamedType, PrimitiveKind, TypeDescriptor, UnionConstraint,
};
pub use error::{Direction, EndpointKind, EndpointRef, ErrorCategory, GenError, GenResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Direction, EndpointKind, EndpointRef, FieldDescriptor, GenError, GenResult,
        GeneratorConfig, Int64Mode, NamedType, PrimitiveKind, TypeDescriptor, UnionConstraint,
    };
}

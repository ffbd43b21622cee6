//! typewire-hub - server-side connection hub
//!
//! This crate provides:
//! - [`Hub`]: the live connections of one socket endpoint, with send-to-one
//!   and broadcast
//! - [`Envelope`]: the `{ type, payload }` message shape generated clients
//!   dispatch on
//! - [`ConnectionHandler`] and [`Hub::serve`] for running a reader loop per
//!   connection
//! - [`HubRegistry`]: one hub per endpoint path
//!
//! The hub is transport-agnostic; servers adapt their socket library to
//! [`FrameSink`] and [`FrameStream`].

mod config;
mod envelope;
mod error;
mod hub;
mod registry;
mod serve;
mod state;
mod transport;

#[cfg(test)]
mod test_sinks;

pub use config::HubConfig;
pub use envelope::Envelope;
pub use error::{HubError, HubResult};
pub use hub::{ConnectionId, Hub};
pub use registry::HubRegistry;
pub use serve::{ConnectionContext, ConnectionHandler};
pub use state::ConnectionState;
pub use transport::{Frame, FrameSink, FrameStream};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ConnectionContext, ConnectionHandler, ConnectionId, ConnectionState, Envelope, Frame,
        FrameSink, FrameStream, Hub, HubConfig, HubError, HubRegistry, HubResult,
    };
}

//! Connection management.
//!
//! Owns the listening side (bind, accept loop), outbound dialing, and the
//! registry both feed into.

pub mod inbound;
pub mod outbound;
pub mod registry;

pub use inbound::{bind_listener, resolve};
pub use outbound::dial;
pub use registry::ConnectionRegistry;

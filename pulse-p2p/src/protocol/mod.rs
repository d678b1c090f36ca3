//! P2P protocol layer.
//!
//! This module contains:
//! - Envelope definitions (greeting, message, heartbeat ping/pong)
//! - Newline-delimited framing codec

pub mod envelope;
pub mod framing;

// Re-export main types
pub use envelope::{Envelope, Heartbeat, TYPE_HEARTBEAT};
pub use framing::{encode_line, EnvelopeCodec};

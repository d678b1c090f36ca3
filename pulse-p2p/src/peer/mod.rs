//! Peer connection model.
//!
//! This module provides:
//! - The `Connection` wrapper around a peer transport
//! - Heartbeat liveness state machine
//! - Read-only connection snapshots for display

pub mod connection;
pub mod info;
pub mod state;

// Re-export main types
pub use connection::{Connection, ReadOutcome};
pub use info::{ConnectionDirection, ConnectionSnapshot};
pub use state::HeartbeatState;

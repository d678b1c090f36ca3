//! P2P error types.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// P2P-specific errors.
#[derive(Debug, Error)]
pub enum P2pError {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to serialize or deserialize an envelope.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Payload parsed as JSON but is not an envelope object.
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// A line exceeded the maximum frame size before its newline arrived.
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// A line was not valid UTF-8.
    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,

    /// Host name did not resolve to any socket address.
    #[error("Could not resolve {host}:{port}")]
    Unresolvable { host: String, port: u16 },

    /// Connection timed out.
    #[error("Connection timeout to {addr}")]
    ConnectionTimeout { addr: String },

    /// A write to a peer did not complete in time.
    #[error("Write timeout to {addr}")]
    WriteTimeout { addr: SocketAddr },

    /// No connection is registered for this address.
    #[error("Peer not found: {0}")]
    PeerNotFound(SocketAddr),

    /// Node is shutting down.
    #[error("Node shutting down")]
    Shutdown,
}

/// Result type for P2P operations.
pub type P2pResult<T> = Result<T, P2pError>;

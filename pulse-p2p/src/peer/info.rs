//! Connection metadata and read-only snapshots.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::peer::HeartbeatState;

/// Direction of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDirection {
    /// We dialed the peer.
    Outbound,
    /// Peer dialed us.
    Inbound,
}

impl fmt::Display for ConnectionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionDirection::Outbound => write!(f, "outbound"),
            ConnectionDirection::Inbound => write!(f, "inbound"),
        }
    }
}

/// Point-in-time view of a registered connection, safe to hand out
/// without holding the node lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    /// Registry key.
    pub addr: SocketAddr,
    /// Direction of the connection.
    pub direction: ConnectionDirection,
    /// Liveness state at snapshot time.
    pub state: HeartbeatState,
    /// Time since the connection was registered.
    pub connected_for: Duration,
    /// Bytes received so far.
    pub bytes_recv: u64,
    /// Bytes sent so far.
    pub bytes_sent: u64,
}

impl ConnectionSnapshot {
    /// Whether the connection was alive at snapshot time.
    pub fn is_alive(&self) -> bool {
        self.state.is_alive()
    }
}

impl fmt::Display for ConnectionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},alive={} ({}, up {}s, rx={}B, tx={}B)",
            self.addr,
            self.is_alive(),
            self.direction,
            self.connected_for.as_secs(),
            self.bytes_recv,
            self.bytes_sent
        )
    }
}

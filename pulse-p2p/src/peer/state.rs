//! Heartbeat liveness state machine.

use std::fmt;

/// Liveness state of a connection.
///
/// ```text
///            ping sent
///   Alive ──────────────▶ AwaitingReply ───▶ removed by the eviction phase
///     ▲                        │
///     └────────────────────────┘
///       any inbound data / pong
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeartbeatState {
    /// Confirmed alive in the current round, or no round has elapsed yet.
    #[default]
    Alive,
    /// Pinged in the current round, nothing received since.
    AwaitingReply,
}

impl HeartbeatState {
    /// Whether the connection counts as alive.
    pub fn is_alive(&self) -> bool {
        matches!(self, HeartbeatState::Alive)
    }

    /// Whether the connection is waiting on a reply and will be evicted
    /// if none arrives.
    pub fn is_awaiting_reply(&self) -> bool {
        matches!(self, HeartbeatState::AwaitingReply)
    }
}

impl fmt::Display for HeartbeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeartbeatState::Alive => write!(f, "alive"),
            HeartbeatState::AwaitingReply => write!(f, "awaiting_reply"),
        }
    }
}

//! State shared between the node handle and its loops.

use std::collections::VecDeque;
use std::net::SocketAddr;

use tokio::sync::Mutex;

use crate::config::P2pConfig;
use crate::manager::ConnectionRegistry;
use crate::message_log::MessageLog;
use crate::peer::Connection;
use crate::protocol::Envelope;
use crate::shutdown::Shutdown;

/// A heartbeat envelope waiting for the heartbeat loop's reply phase.
#[derive(Debug, Clone)]
pub struct InboundHeartbeat {
    /// Sender's registry key.
    pub peer: SocketAddr,
    /// Raw line as received.
    pub raw: String,
    /// Parsed envelope.
    pub envelope: Envelope,
}

/// Mutable node state. Guarded as a whole by one lock.
///
/// Helpers take `&mut NodeState` rather than the lock so that a held lock
/// is never re-acquired.
#[derive(Debug, Default)]
pub struct NodeState {
    /// Registered connections.
    pub registry: ConnectionRegistry,
    /// Event log for display.
    pub log: MessageLog,
    /// Heartbeats received since the last reply phase, oldest first.
    pub heartbeat_queue: VecDeque<InboundHeartbeat>,
}

impl NodeState {
    /// Register a connection, closing any connection it replaces.
    pub async fn register(&mut self, connection: Connection) {
        let addr = connection.addr();
        if let Some(old) = self.registry.upsert(connection) {
            tracing::debug!(peer = %addr, "Replacing existing connection");
            self.log
                .push_payload("replaced existing connection", addr);
            self.close_connection(old).await;
        }
    }

    /// Shut a removed connection down, logging rather than propagating
    /// failures.
    pub async fn close_connection(&mut self, connection: Connection) {
        let addr = connection.addr();
        if let Err(e) = connection.shutdown().await {
            tracing::debug!(peer = %addr, error = %e, "Error closing connection");
            self.log.push_text(format!("close {}: {}", addr, e));
        }
    }
}

/// Everything the loops need, behind one `Arc`.
#[derive(Debug)]
pub struct Shared {
    /// Node configuration.
    pub config: P2pConfig,
    /// Advertised `host:port`.
    pub hostname: String,
    /// The node lock.
    pub state: Mutex<NodeState>,
    /// Closing flag.
    pub shutdown: Shutdown,
}

impl Shared {
    pub fn new(config: P2pConfig, hostname: String) -> Self {
        Self {
            config,
            hostname,
            state: Mutex::new(NodeState::default()),
            shutdown: Shutdown::new(),
        }
    }
}

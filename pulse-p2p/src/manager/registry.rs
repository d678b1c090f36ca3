//! Connection registry.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::peer::{Connection, ConnectionSnapshot};

/// Authoritative mapping of remote address to connection.
///
/// Not synchronized on its own: it lives inside the node state and every
/// access happens under the node lock. `remove` hands the connection back
/// without closing it; the caller shuts the transport down.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Registered connections by remote address.
    connections: HashMap<SocketAddr, Connection>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under its address.
    ///
    /// An existing entry for the same address is replaced and returned so
    /// the caller can close it; at most one connection exists per address.
    pub fn upsert(&mut self, connection: Connection) -> Option<Connection> {
        self.connections.insert(connection.addr(), connection)
    }

    /// Get a connection by address.
    pub fn get(&self, addr: &SocketAddr) -> Option<&Connection> {
        self.connections.get(addr)
    }

    /// Get a mutable reference to a connection.
    pub fn get_mut(&mut self, addr: &SocketAddr) -> Option<&mut Connection> {
        self.connections.get_mut(addr)
    }

    /// Remove a connection. The transport is left open.
    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Connection> {
        self.connections.remove(addr)
    }

    /// Check if an address is registered.
    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.connections.contains_key(addr)
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Iterate mutably over all connections.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.values_mut()
    }

    /// Addresses of connections that have not confirmed liveness since the
    /// last ping.
    pub fn awaiting_reply(&self) -> Vec<SocketAddr> {
        self.connections
            .values()
            .filter(|c| c.state().is_awaiting_reply())
            .map(Connection::addr)
            .collect()
    }

    /// Remove every connection.
    pub fn drain(&mut self) -> Vec<Connection> {
        self.connections.drain().map(|(_, c)| c).collect()
    }

    /// Snapshots of every connection, sorted by address.
    pub fn snapshots(&self) -> Vec<ConnectionSnapshot> {
        let mut snapshots: Vec<_> = self.connections.values().map(Connection::snapshot).collect();
        snapshots.sort_by_key(|s| s.addr);
        snapshots
    }
}

//! Peer node.
//!
//! Owns the listening socket (through the accept task), the three loops and
//! the shared node state. Everything the command line needs goes through
//! [`PeerNode`].

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::P2pConfig;
use crate::error::{P2pError, P2pResult};
use crate::heartbeat::run_heartbeat_loop;
use crate::manager::inbound::run_accept_loop;
use crate::manager::{bind_listener, dial};
use crate::message_log::LogEntry;
use crate::peer::{Connection, ConnectionDirection, ConnectionSnapshot};
use crate::protocol::{encode_line, Envelope};
use crate::receive::run_receive_loop;
use crate::shared::{NodeState, Shared};

/// Join handles of the node loops.
struct LoopHandles {
    /// Hands the listener back when it stops.
    accept: JoinHandle<TcpListener>,
    receive: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

/// A running peer node.
pub struct PeerNode {
    shared: Arc<Shared>,
    local_addr: SocketAddr,
    /// `None` once closed.
    tasks: Mutex<Option<LoopHandles>>,
}

impl PeerNode {
    /// Bind the listening socket and spawn the accept, receive and heartbeat
    /// loops. Bind failure is returned as an error.
    pub async fn start(config: P2pConfig) -> P2pResult<Self> {
        let listener = bind_listener(&config).await?;
        let local_addr = listener.local_addr()?;
        let hostname = format!("{}:{}", config.host, local_addr.port());

        tracing::info!(
            addr = %local_addr,
            host = %hostname,
            heartbeat_round = ?config.heartbeat_round(),
            "P2P node listening"
        );

        let shared = Arc::new(Shared::new(config, hostname));
        let tasks = LoopHandles {
            accept: tokio::spawn(run_accept_loop(shared.clone(), listener)),
            receive: tokio::spawn(run_receive_loop(shared.clone())),
            heartbeat: tokio::spawn(run_heartbeat_loop(shared.clone())),
        };

        Ok(Self {
            shared,
            local_addr,
            tasks: Mutex::new(Some(tasks)),
        })
    }

    /// Advertised identity: configured host and bound port.
    pub fn hostname(&self) -> &str {
        &self.shared.hostname
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether shutdown has started.
    pub fn is_closing(&self) -> bool {
        self.shared.shutdown.is_closing()
    }

    /// Dial a peer and register the connection.
    ///
    /// Returns the registry key (the remote address as seen by the socket).
    /// Failures are recorded in the message log as well as returned; they
    /// never affect existing connections.
    pub async fn connect(&self, host: &str, port: u16) -> P2pResult<SocketAddr> {
        match self.try_connect(host, port).await {
            Ok(addr) => {
                tracing::info!(peer = %addr, "Connected to peer");
                Ok(addr)
            }
            Err(e) => {
                tracing::warn!(host = %host, port, error = %e, "Failed to connect");
                self.shared
                    .state
                    .lock()
                    .await
                    .log
                    .push_text(format!("failed to connect to {}:{}: {}", host, port, e));
                Err(e)
            }
        }
    }

    async fn try_connect(&self, host: &str, port: u16) -> P2pResult<SocketAddr> {
        if self.is_closing() {
            return Err(P2pError::Shutdown);
        }

        let config = &self.shared.config;
        let stream = dial(host, port, config.connect_timeout).await?;
        let addr = stream.peer_addr()?;

        let mut state = self.shared.state.lock().await;
        // Checked again under the lock: close() may have drained the registry.
        if self.is_closing() {
            return Err(P2pError::Shutdown);
        }
        state.log.push_payload("connecting to", addr);
        state
            .register(Connection::new(
                addr,
                stream,
                ConnectionDirection::Outbound,
                config.max_frame_size,
            ))
            .await;
        Ok(addr)
    }

    /// Write `envelope` to every registered connection.
    ///
    /// Serializes once. Per-connection failures are logged and skipped.
    /// Returns the number of connections written to.
    pub async fn send_all(&self, envelope: &Envelope) -> P2pResult<usize> {
        let config = &self.shared.config;

        let (json, frame) = encode_line(envelope, config.max_frame_size)?;

        let mut state = self.shared.state.lock().await;
        let NodeState { registry, log, .. } = &mut *state;

        let mut delivered = 0;
        for conn in registry.iter_mut() {
            match conn.write_frame(&frame, config.write_timeout).await {
                Ok(_) => {
                    delivered += 1;
                    tracing::debug!(peer = %conn.addr(), "Sent envelope");
                    log.push_text(json.clone());
                }
                Err(e) => {
                    tracing::warn!(peer = %conn.addr(), error = %e, "Failed to send envelope");
                    log.push_text(format!("send {}: {}", conn.addr(), e));
                }
            }
        }
        Ok(delivered)
    }

    /// Broadcast an application message from this node.
    pub async fn send_message(&self, text: impl Into<String>) -> P2pResult<usize> {
        let envelope = Envelope::message(self.hostname(), text);
        self.send_all(&envelope).await
    }

    /// Write `envelope` to one registered connection.
    pub async fn send_to(&self, addr: SocketAddr, envelope: &Envelope) -> P2pResult<usize> {
        let write_timeout = self.shared.config.write_timeout;
        let mut state = self.shared.state.lock().await;
        let conn = state
            .registry
            .get_mut(&addr)
            .ok_or(P2pError::PeerNotFound(addr))?;

        let sent = conn.send(envelope, write_timeout).await?;
        state.log.push_text(envelope.to_json()?);
        Ok(sent)
    }

    /// Remove and close one connection.
    pub async fn disconnect(&self, addr: SocketAddr) -> P2pResult<()> {
        let mut state = self.shared.state.lock().await;
        let conn = state
            .registry
            .remove(&addr)
            .ok_or(P2pError::PeerNotFound(addr))?;

        tracing::info!(peer = %addr, "Disconnecting peer");
        state.log.push_text(format!("disconnected {}", addr));
        state.close_connection(conn).await;
        Ok(())
    }

    /// Remove and return all pending log entries, oldest first.
    pub async fn drain_messages(&self) -> Vec<LogEntry> {
        self.shared.state.lock().await.log.drain()
    }

    /// Snapshots of all registered connections, sorted by address.
    pub async fn list_connections(&self) -> Vec<ConnectionSnapshot> {
        self.shared.state.lock().await.registry.snapshots()
    }

    pub async fn connection_count(&self) -> usize {
        self.shared.state.lock().await.registry.len()
    }

    /// Stop the loops and close every socket.
    ///
    /// The receive and heartbeat loops are joined before the listener is
    /// released. Calling `close` again is a no-op.
    pub async fn close(&self) -> P2pResult<()> {
        let Some(tasks) = self.tasks.lock().await.take() else {
            tracing::debug!("Peer node already closed");
            return Ok(());
        };

        tracing::info!(host = %self.hostname(), "Shutting down peer node");
        self.shared.shutdown.trigger();

        if let Err(e) = tasks.receive.await {
            tracing::warn!(error = %e, "Receive loop failed");
        }
        if let Err(e) = tasks.heartbeat.await {
            tracing::warn!(error = %e, "Heartbeat loop failed");
        }
        let listener = match tasks.accept.await {
            Ok(listener) => Some(listener),
            Err(e) => {
                tracing::warn!(error = %e, "Accept loop failed");
                None
            }
        };

        let mut state = self.shared.state.lock().await;
        drop(listener);
        for conn in state.registry.drain() {
            state.close_connection(conn).await;
        }
        state.heartbeat_queue.clear();
        state.log.push_text("successfully closed the node");

        tracing::info!("Peer node closed");
        Ok(())
    }
}

impl Drop for PeerNode {
    fn drop(&mut self) {
        // Loops stop on their own; nothing is joined here.
        self.shared.shutdown.trigger();
    }
}

impl std::fmt::Debug for PeerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerNode")
            .field("hostname", &self.shared.hostname)
            .field("local_addr", &self.local_addr)
            .field("closing", &self.is_closing())
            .finish()
    }
}

//! Node configuration.

use std::time::Duration;

use pulse_p2p::P2pConfig;

use crate::cli::{Cli, PeerTarget};

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Host to bind and advertise.
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// Peers to dial at startup.
    pub bootstrap_peers: Vec<PeerTarget>,

    /// Heartbeat phase length.
    pub heartbeat_interval: Duration,

    /// Receive poll interval.
    pub recv_interval: Duration,

    /// Log level.
    pub log_level: String,
}

impl NodeConfig {
    /// Create a node configuration from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            host: cli.host.clone(),
            port: cli.port,
            bootstrap_peers: cli.connect.clone(),
            heartbeat_interval: Duration::from_secs(cli.heartbeat_interval_secs),
            recv_interval: Duration::from_millis(cli.recv_interval_ms),
            log_level: cli.log_level.clone(),
        }
    }

    /// Build P2P configuration from node config.
    pub fn p2p_config(&self) -> P2pConfig {
        P2pConfig::new(self.host.clone(), self.port)
            .with_heartbeat_interval(self.heartbeat_interval)
            .with_recv_interval(self.recv_interval)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        let p2p = P2pConfig::default();
        Self {
            host: p2p.host,
            port: p2p.port,
            bootstrap_peers: Vec::new(),
            heartbeat_interval: p2p.heartbeat_interval,
            recv_interval: p2p.recv_interval,
            log_level: "info".to_string(),
        }
    }
}

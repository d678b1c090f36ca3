//! Command-line argument parsing.

use std::fmt;
use std::str::FromStr;

use clap::Parser;

use pulse_p2p::config::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_HOST, DEFAULT_RECV_INTERVAL};

/// Interactive pulse peer node.
#[derive(Parser, Debug, Clone)]
#[command(name = "pulse-node")]
#[command(about = "Minimal peer-to-peer node with heartbeat liveness")]
#[command(version)]
pub struct Cli {
    /// Port to listen on.
    pub port: u16,

    /// Host to bind and advertise.
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Comma-separated list of peers (host:port) to dial at startup.
    #[arg(long, value_delimiter = ',')]
    pub connect: Vec<PeerTarget>,

    /// Seconds per heartbeat phase (a round is three phases).
    #[arg(
        long,
        default_value_t = DEFAULT_HEARTBEAT_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub heartbeat_interval_secs: u64,

    /// Milliseconds between receive polls.
    #[arg(
        long,
        default_value_t = DEFAULT_RECV_INTERVAL.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub recv_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// A peer to dial, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerTarget {
    pub host: String,
    pub port: u16,
}

impl FromStr for PeerTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("expected host:port, got `{}`", s))?;
        if host.is_empty() {
            return Err(format!("missing host in `{}`", s));
        }
        let port = port
            .parse()
            .map_err(|_| format!("invalid port in `{}`", s))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for PeerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

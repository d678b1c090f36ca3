//! P2P configuration.

use std::time::Duration;

/// Default host the listener binds to and advertises.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 9000;

/// Default length of one heartbeat interval. A full round is three intervals.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Default delay between two receive polls.
pub const DEFAULT_RECV_INTERVAL: Duration = Duration::from_secs(1);

/// Default maximum number of bytes read from one connection per poll.
pub const DEFAULT_MAX_READ_SIZE: usize = 256;

/// Default maximum length of a single envelope line (64 KiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Default listen backlog.
pub const DEFAULT_LISTEN_BACKLOG: u32 = 10;

/// Default pause after each admitted inbound connection.
pub const DEFAULT_ACCEPT_PACING: Duration = Duration::from_secs(3);

/// Default timeout for outbound dials.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a single write to a peer.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a peer node.
#[derive(Debug, Clone)]
pub struct P2pConfig {
    /// Host to bind to. Also the host part of the advertised `host:port`.
    pub host: String,

    /// Port to bind to. `0` lets the OS pick one.
    pub port: u16,

    /// Length of one heartbeat interval.
    pub heartbeat_interval: Duration,

    /// Delay between receive polls.
    pub recv_interval: Duration,

    /// Maximum bytes read from one connection per receive poll.
    pub max_read_size: usize,

    /// Maximum length of one envelope line before it is discarded.
    pub max_frame_size: usize,

    /// Listen backlog passed to `listen(2)`.
    pub listen_backlog: u32,

    /// Pause after each admitted inbound connection. Zero disables it.
    pub accept_pacing: Duration,

    /// Timeout for establishing outbound connections.
    pub connect_timeout: Duration,

    /// Timeout for a single write to a peer.
    pub write_timeout: Duration,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            recv_interval: DEFAULT_RECV_INTERVAL,
            max_read_size: DEFAULT_MAX_READ_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            listen_backlog: DEFAULT_LISTEN_BACKLOG,
            accept_pacing: DEFAULT_ACCEPT_PACING,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl P2pConfig {
    /// Create a new configuration for the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the receive poll interval.
    pub fn with_recv_interval(mut self, interval: Duration) -> Self {
        self.recv_interval = interval;
        self
    }

    /// Set the maximum bytes read per connection per poll.
    pub fn with_max_read_size(mut self, size: usize) -> Self {
        self.max_read_size = size;
        self
    }

    /// Set the maximum envelope line length.
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the listen backlog.
    pub fn with_listen_backlog(mut self, backlog: u32) -> Self {
        self.listen_backlog = backlog;
        self
    }

    /// Set the pause after each admitted inbound connection.
    pub fn with_accept_pacing(mut self, pacing: Duration) -> Self {
        self.accept_pacing = pacing;
        self
    }

    /// Set the outbound connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Duration of one full heartbeat round (ping, reply, evict).
    pub fn heartbeat_round(&self) -> Duration {
        self.heartbeat_interval * 3
    }
}

//! Minimal peer-to-peer node.
//!
//! A node listens for TCP peers, dials peers on request, and exchanges
//! newline-delimited JSON envelopes with every registered connection.
//! Liveness is tracked with a ping/pong heartbeat; peers that stay silent
//! for a round are evicted.
//!
//! # Architecture
//!
//! Three loops share one lock-guarded node state (connection registry,
//! message log, heartbeat queue):
//!
//! ```text
//! PeerNode
//! ├── Accept task    (admit inbound peers, greet them)
//! ├── Receive task   (non-blocking reads, route envelopes)
//! └── Heartbeat task (ping → replies → eviction)
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use pulse_p2p::{P2pConfig, PeerNode};
//!
//! # async fn run() -> pulse_p2p::P2pResult<()> {
//! let node = PeerNode::start(P2pConfig::new("127.0.0.1", 9000)).await?;
//! node.connect("127.0.0.1", 9001).await?;
//! node.send_message("hi").await?;
//!
//! for entry in node.drain_messages().await {
//!     println!("{}", entry);
//! }
//! node.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;

pub mod protocol;
pub mod peer;
pub mod manager;
pub mod message_log;
pub mod shutdown;
pub mod node;

mod heartbeat;
mod receive;
mod shared;

// Re-export main types
pub use config::P2pConfig;
pub use error::{P2pError, P2pResult};
pub use message_log::{LogEntry, MessageLog};
pub use node::PeerNode;
pub use peer::{ConnectionDirection, ConnectionSnapshot, HeartbeatState};
pub use protocol::Envelope;

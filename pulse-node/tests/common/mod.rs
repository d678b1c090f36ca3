//! Shared test helpers for pulse-node integration tests.

#![allow(dead_code)]

use std::time::Duration;

use tokio::time::sleep;

use pulse_p2p::{LogEntry, P2pConfig, PeerNode};

/// Heartbeat interval for test nodes.
pub const TEST_HEARTBEAT_MS: u64 = 100;

/// Configuration with an OS-assigned port and short intervals.
pub fn test_config() -> P2pConfig {
    P2pConfig::new("127.0.0.1", 0)
        .with_heartbeat_interval(Duration::from_millis(TEST_HEARTBEAT_MS))
        .with_recv_interval(Duration::from_millis(10))
        .with_accept_pacing(Duration::ZERO)
        .with_connect_timeout(Duration::from_secs(2))
}

/// Start a node on an OS-assigned port.
pub async fn start_node() -> PeerNode {
    PeerNode::start(test_config()).await.expect("node should bind")
}

/// Wait for a condition with timeout, polling periodically.
pub async fn wait_for<F, Fut>(timeout_ms: u64, poll_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout_duration = Duration::from_millis(timeout_ms);
    let poll_duration = Duration::from_millis(poll_ms);

    loop {
        if condition().await {
            return true;
        }
        if start.elapsed() > timeout_duration {
            return false;
        }
        sleep(poll_duration).await;
    }
}

/// Drain `node`'s log until an entry's text contains `needle`.
pub async fn wait_for_log(node: &PeerNode, needle: &str, timeout_ms: u64) -> Option<LogEntry> {
    let start = std::time::Instant::now();
    loop {
        if let Some(entry) = node
            .drain_messages()
            .await
            .into_iter()
            .find(|e| e.text().contains(needle))
        {
            return Some(entry);
        }
        if start.elapsed() > Duration::from_millis(timeout_ms) {
            return None;
        }
        sleep(Duration::from_millis(10)).await;
    }
}

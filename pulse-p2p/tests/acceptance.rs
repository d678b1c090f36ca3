//! Acceptance tests for the peer node.
//!
//! These tests verify the acceptance criteria:
//! 1. Connect - Two nodes register each other and the dialer is greeted
//! 2. Broadcast - `send_all` reaches every connection
//! 3. Liveness - Responsive peers survive heartbeat rounds
//! 4. Eviction - A silent peer is removed and its socket closed
//! 5. Symmetric heartbeat - A ping is answered with exactly one pong
//! 6. Failures - A failed dial leaves the node running
//! 7. Uniqueness - One connection per remote address
//! 8. Shutdown - A closed node disappears from its peers

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};

use pulse_p2p::{LogEntry, P2pConfig, PeerNode};

/// Heartbeat interval used by every test node. A round is three of these.
const HEARTBEAT_MS: u64 = 100;

/// Timeout for conditions that need a few heartbeat rounds.
const ROUNDS_TIMEOUT_MS: u64 = 3000;

/// Create a test node configuration with port 0 (OS assigns port).
fn test_config() -> P2pConfig {
    P2pConfig::new("127.0.0.1", 0)
        .with_heartbeat_interval(Duration::from_millis(HEARTBEAT_MS))
        .with_recv_interval(Duration::from_millis(10))
        .with_accept_pacing(Duration::ZERO)
        .with_connect_timeout(Duration::from_secs(2))
}

async fn start_node() -> PeerNode {
    PeerNode::start(test_config()).await.expect("node should bind")
}

/// Wait for a condition with timeout, polling periodically.
async fn wait_for<F, Fut>(timeout_ms: u64, poll_ms: u64, mut condition: F) -> bool
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

/// Wait until `node` has exactly `count` registered connections.
async fn wait_for_connections(node: &PeerNode, count: usize, timeout_ms: u64) -> bool {
    wait_for(timeout_ms, 10, move || async move {
        node.connection_count().await == count
    })
    .await
}

/// Drain a node's log into `seen` until `predicate` matches an entry.
async fn wait_for_entry<P>(node: &PeerNode, seen: &mut Vec<LogEntry>, predicate: P) -> bool
where
    P: Fn(&LogEntry) -> bool,
{
    let start = std::time::Instant::now();
    loop {
        seen.extend(node.drain_messages().await);
        if seen.iter().any(&predicate) {
            return true;
        }
        if start.elapsed() > Duration::from_millis(ROUNDS_TIMEOUT_MS) {
            return false;
        }
        sleep(Duration::from_millis(10)).await;
    }
}

/// Read from a raw client until the node closes the socket.
async fn read_until_eof(stream: &mut TcpStream) -> String {
    let mut received = Vec::new();
    timeout(
        Duration::from_millis(ROUNDS_TIMEOUT_MS),
        stream.read_to_end(&mut received),
    )
    .await
    .expect("node should close the socket")
    .expect("read should succeed");
    String::from_utf8(received).unwrap()
}

// ============================================================================
// Test 1: Two nodes connect
// ============================================================================

#[tokio::test]
async fn test_two_nodes_connect() {
    let node_a = start_node().await;
    let node_b = start_node().await;
    let port_a = node_a.local_addr().port();

    let addr_a = node_b.connect("127.0.0.1", port_a).await.unwrap();
    assert_eq!(addr_a, node_a.local_addr());
    assert_eq!(node_b.connection_count().await, 1);

    let registered = wait_for_connections(&node_a, 1, 2000).await;
    assert!(registered, "A should register B's connection");

    // A greets the dialer.
    let greeting = format!("{{\"host\":\"127.0.0.1:{}\"}}", port_a);
    let mut seen = Vec::new();
    let greeted = wait_for_entry(&node_b, &mut seen, |e| {
        e.peer() == Some(addr_a) && e.text() == greeting
    })
    .await;
    assert!(greeted, "B should log A's greeting, got {:?}", seen);

    // A's log records the admission.
    let entries = node_a.drain_messages().await;
    assert!(entries.iter().any(|e| e.text() == "received connection"));

    node_a.close().await.unwrap();
    node_b.close().await.unwrap();
}

// ============================================================================
// Test 2: Broadcast reaches every connection
// ============================================================================

#[tokio::test]
async fn test_broadcast_delivers_to_all() {
    let node_a = start_node().await;
    let node_b = start_node().await;
    let node_c = start_node().await;
    let port_a = node_a.local_addr().port();

    let addr_a = node_b.connect("127.0.0.1", port_a).await.unwrap();
    node_c.connect("127.0.0.1", port_a).await.unwrap();

    let registered = wait_for_connections(&node_a, 2, 2000).await;
    assert!(registered, "A should register both peers");

    assert_eq!(node_a.send_message("hi").await.unwrap(), 2);

    let expected = format!("{{\"host\":\"127.0.0.1:{}\",\"message\":\"hi\"}}", port_a);
    for node in [&node_b, &node_c] {
        let mut seen = Vec::new();
        let delivered = wait_for_entry(node, &mut seen, |e| {
            *e == LogEntry::Payload {
                payload: expected.clone(),
                peer: addr_a,
            }
        })
        .await;
        assert!(delivered, "broadcast should reach {}, got {:?}", node.hostname(), seen);
    }

    // Each successful write is logged by the sender.
    let sent = node_a
        .drain_messages()
        .await
        .into_iter()
        .filter(|e| e.text() == expected)
        .count();
    assert_eq!(sent, 2);

    for node in [&node_a, &node_b, &node_c] {
        node.close().await.unwrap();
    }
}

#[tokio::test]
async fn test_broadcast_skips_failed_connection() {
    let node_a = start_node().await;
    let node_b = start_node().await;
    let port_a = node_a.local_addr().port();

    node_b.connect("127.0.0.1", port_a).await.unwrap();

    // A raw client that vanishes right after connecting.
    let raw = TcpStream::connect(node_a.local_addr()).await.unwrap();
    let registered = wait_for_connections(&node_a, 2, 2000).await;
    assert!(registered);
    drop(raw);
    sleep(Duration::from_millis(50)).await;

    // Writes to a reset socket can take a round to fail; the live peer must
    // receive every broadcast regardless.
    for _ in 0..3 {
        let delivered = node_a.send_message("still here").await.unwrap();
        assert!(delivered >= 1);
    }

    let mut seen = Vec::new();
    let delivered = wait_for_entry(&node_b, &mut seen, |e| e.text().contains("still here")).await;
    assert!(delivered);

    node_a.close().await.unwrap();
    node_b.close().await.unwrap();
}

// ============================================================================
// Test 3: Liveness across rounds
// ============================================================================

#[tokio::test]
async fn test_responsive_peers_stay_connected() {
    let node_a = start_node().await;
    let node_b = start_node().await;
    node_b
        .connect("127.0.0.1", node_a.local_addr().port())
        .await
        .unwrap();

    let registered = wait_for_connections(&node_a, 1, 2000).await;
    assert!(registered);

    // Three full rounds.
    sleep(Duration::from_millis(HEARTBEAT_MS * 9 + 50)).await;

    assert_eq!(node_a.connection_count().await, 1);
    assert_eq!(node_b.connection_count().await, 1);

    // Both sides pinged and answered.
    let log_b = node_b.drain_messages().await;
    assert!(log_b.iter().any(|e| e.text().contains("\"ping\":")));
    assert!(log_b.iter().any(|e| e.text().contains("\"ping-response\":")));
    assert!(!log_b.iter().any(|e| e.text().starts_with("removing")));

    node_a.close().await.unwrap();
    node_b.close().await.unwrap();
}

// ============================================================================
// Test 4: Silent peer eviction
// ============================================================================

#[tokio::test]
async fn test_silent_peer_evicted() {
    let node = start_node().await;
    let mut silent = TcpStream::connect(node.local_addr()).await.unwrap();
    let silent_addr = silent.local_addr().unwrap();

    let registered = wait_for_connections(&node, 1, 2000).await;
    assert!(registered);

    let evicted = wait_for_connections(&node, 0, ROUNDS_TIMEOUT_MS).await;
    assert!(evicted, "silent peer should be evicted");

    // The peer got its greeting and a ping, then end of stream.
    let received = read_until_eof(&mut silent).await;
    let mut lines = received.lines();
    assert_eq!(lines.next(), Some(format!("{{\"host\":\"{}\"}}", node.hostname()).as_str()));
    assert!(lines.any(|l| l.contains("\"ping\":")));

    let entries = node.drain_messages().await;
    assert!(entries
        .iter()
        .any(|e| e.text().starts_with(&format!("removing {}", silent_addr))));

    node.close().await.unwrap();
}

#[tokio::test]
async fn test_silent_peer_evicted_two_intervals_after_ping() {
    const INTERVAL_MS: u64 = 200;
    const SLACK_MS: u64 = 100;

    let config = test_config().with_heartbeat_interval(Duration::from_millis(INTERVAL_MS));
    let node = PeerNode::start(config).await.unwrap();
    let mut silent = TcpStream::connect(node.local_addr()).await.unwrap();

    // Note when the first ping reaches the peer; the peer never answers.
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    let pinged_at = loop {
        let n = timeout(Duration::from_millis(ROUNDS_TIMEOUT_MS), silent.read(&mut buf))
            .await
            .expect("ping should arrive")
            .unwrap();
        assert_ne!(n, 0, "closed before the ping arrived");
        received.extend_from_slice(&buf[..n]);
        if String::from_utf8_lossy(&received).contains("\"ping\":") {
            break tokio::time::Instant::now();
        }
    };

    // Still registered after the reply phase, one interval before eviction.
    tokio::time::sleep_until(pinged_at + Duration::from_millis(2 * INTERVAL_MS - SLACK_MS)).await;
    assert_eq!(node.connection_count().await, 1, "evicted before the eviction phase");

    // Gone shortly after the eviction phase.
    let closed = tokio::time::timeout_at(
        pinged_at + Duration::from_millis(2 * INTERVAL_MS + SLACK_MS),
        silent.read_to_end(&mut received),
    )
    .await;
    assert!(matches!(closed, Ok(Ok(_))), "not evicted two intervals after the ping");
    assert_eq!(node.connection_count().await, 0);

    node.close().await.unwrap();
}

#[tokio::test]
async fn test_vanished_node_is_evicted() {
    let node_a = start_node().await;
    let node_b = start_node().await;
    node_b
        .connect("127.0.0.1", node_a.local_addr().port())
        .await
        .unwrap();

    let registered = wait_for_connections(&node_a, 1, 2000).await;
    assert!(registered);

    // B disappears without closing.
    drop(node_b);

    let evicted = wait_for_connections(&node_a, 0, ROUNDS_TIMEOUT_MS).await;
    assert!(evicted, "A should evict the vanished peer");

    node_a.close().await.unwrap();
}

// ============================================================================
// Test 5: Symmetric heartbeat
// ============================================================================

#[tokio::test]
async fn test_ping_answered_with_one_pong() {
    let node = start_node().await;
    let mut client = TcpStream::connect(node.local_addr()).await.unwrap();

    client
        .write_all(b"{\"host\":\"client:1\",\"type\":\"heartbeat\",\"ping\":\"client:1\"}\n")
        .await
        .unwrap();

    // After the ping the client stays silent, so the node answers, then
    // evicts it and closes the socket.
    let received = read_until_eof(&mut client).await;

    let pong = format!(
        "{{\"host\":\"{0}\",\"type\":\"heartbeat\",\"ping-response\":\"{0}\"}}",
        node.hostname()
    );
    let pongs = received.lines().filter(|l| *l == pong).count();
    assert_eq!(pongs, 1, "expected one pong in {:?}", received);

    node.close().await.unwrap();
}

// ============================================================================
// Test 6: Failed dial is not fatal
// ============================================================================

#[tokio::test]
async fn test_connect_failure_not_fatal() {
    let node_a = start_node().await;

    // Grab a free port, then release it.
    let dead_port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    assert!(node_a.connect("127.0.0.1", dead_port).await.is_err());
    assert!(node_a.connect("no-such-host.invalid", 9000).await.is_err());
    assert_eq!(node_a.connection_count().await, 0);

    let entries = node_a.drain_messages().await;
    let failures = entries
        .iter()
        .filter(|e| e.text().starts_with("failed to connect"))
        .count();
    assert_eq!(failures, 2);

    // Still accepting.
    let node_b = start_node().await;
    node_b
        .connect("127.0.0.1", node_a.local_addr().port())
        .await
        .unwrap();
    let registered = wait_for_connections(&node_a, 1, 2000).await;
    assert!(registered);

    node_a.close().await.unwrap();
    node_b.close().await.unwrap();
}

// ============================================================================
// Test 7: Registry uniqueness
// ============================================================================

#[tokio::test]
async fn test_reconnect_replaces_connection() {
    let node_a = start_node().await;
    let node_b = start_node().await;
    let port_a = node_a.local_addr().port();

    let first = node_b.connect("127.0.0.1", port_a).await.unwrap();
    let second = node_b.connect("127.0.0.1", port_a).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(node_b.connection_count().await, 1);

    let connections = node_b.list_connections().await;
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].addr, first);

    let entries = node_b.drain_messages().await;
    assert!(entries
        .iter()
        .any(|e| e.text() == "replaced existing connection"));

    node_a.close().await.unwrap();
    node_b.close().await.unwrap();
}

// ============================================================================
// Test 8: Shutdown
// ============================================================================

#[tokio::test]
async fn test_closed_node_leaves_peers() {
    let node_a = start_node().await;
    let node_b = start_node().await;
    node_b
        .connect("127.0.0.1", node_a.local_addr().port())
        .await
        .unwrap();
    let registered = wait_for_connections(&node_a, 1, 2000).await;
    assert!(registered);

    timeout(Duration::from_secs(2), node_a.close())
        .await
        .expect("close should not hang")
        .unwrap();
    assert_eq!(node_a.connection_count().await, 0);
    node_a.close().await.unwrap();

    // The listener is gone.
    assert!(TcpStream::connect(node_a.local_addr()).await.is_err());

    let evicted = wait_for_connections(&node_b, 0, ROUNDS_TIMEOUT_MS).await;
    assert!(evicted, "B should evict the closed node");

    node_b.close().await.unwrap();
}

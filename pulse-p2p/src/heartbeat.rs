//! Heartbeat loop.
//!
//! A round has three phases, each followed by one heartbeat interval:
//!
//! 1. ping: every connection goes to awaiting-reply and is sent a ping
//! 2. replies: queued heartbeats mark their senders alive; pings get a pong
//! 3. eviction: connections still awaiting a reply are closed and removed
//!
//! Any inbound data marks a connection alive (see the receive loop), so a
//! peer survives a round as long as it says something within two intervals
//! of the ping.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::P2pConfig;
use crate::protocol::{encode_line, Envelope};
use crate::shared::{NodeState, Shared};

/// Run heartbeat rounds until shutdown.
pub(crate) async fn run_heartbeat_loop(shared: Arc<Shared>) {
    let config = &shared.config;
    let interval = config.heartbeat_interval;
    let hostname = shared.hostname.as_str();

    while !shared.shutdown.is_closing() {
        {
            let mut state = shared.state.lock().await;
            ping_phase(&mut state, hostname, config).await;
        }
        if !shared.shutdown.sleep(interval).await {
            break;
        }

        {
            let mut state = shared.state.lock().await;
            reply_phase(&mut state, hostname, config).await;
        }
        if !shared.shutdown.sleep(interval).await {
            break;
        }

        {
            let mut state = shared.state.lock().await;
            let evicted = evict_phase(&mut state).await;
            if !evicted.is_empty() {
                tracing::info!(count = evicted.len(), "Evicted unresponsive peers");
            }
        }
        if !shared.shutdown.sleep(interval).await {
            break;
        }
    }

    tracing::debug!("Heartbeat loop stopped");
}

/// Mark every connection awaiting-reply and ping it.
/// Returns the number of pings written.
///
/// If the ping cannot be encoded the round's ping is skipped and no
/// connection changes state.
pub(crate) async fn ping_phase(state: &mut NodeState, hostname: &str, config: &P2pConfig) -> usize {
    let NodeState { registry, log, .. } = state;
    log.push_text("starting heartbeat");

    let (ping_json, frame) = match encode_line(&Envelope::ping(hostname), config.max_frame_size) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode ping");
            log.push_text(format!("heartbeat: {}", e));
            return 0;
        }
    };

    let mut sent = 0;
    for conn in registry.iter_mut() {
        conn.mark_awaiting_reply();
        match conn.write_frame(&frame, config.write_timeout).await {
            Ok(_) => {
                sent += 1;
                log.push_text(ping_json.clone());
            }
            Err(e) => {
                tracing::warn!(peer = %conn.addr(), error = %e, "Failed to send ping");
                log.push_text(format!("heartbeat {}: {}", conn.addr(), e));
            }
        }
    }
    sent
}

/// Drain queued heartbeats. Each marks its sender alive; each ping gets
/// exactly one pong. Returns the number of pongs written.
///
/// If the pong cannot be encoded, senders are still marked alive but no
/// pongs are written.
pub(crate) async fn reply_phase(state: &mut NodeState, hostname: &str, config: &P2pConfig) -> usize {
    let NodeState {
        registry,
        log,
        heartbeat_queue,
    } = state;

    let pong = match encode_line(&Envelope::pong(hostname), config.max_frame_size) {
        Ok(encoded) => Some(encoded),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode pong");
            log.push_text(format!("heartbeat: {}", e));
            None
        }
    };

    let mut sent = 0;
    while let Some(heartbeat) = heartbeat_queue.pop_front() {
        tracing::trace!(peer = %heartbeat.peer, raw = %heartbeat.raw, "Processing heartbeat");
        let Some(conn) = registry.get_mut(&heartbeat.peer) else {
            tracing::debug!(peer = %heartbeat.peer, "Heartbeat from unregistered peer");
            continue;
        };

        if conn.mark_alive() {
            tracing::debug!(peer = %heartbeat.peer, "Heartbeat confirmed");
            log.push_payload("heartbeat confirmed", heartbeat.peer);
        }

        let Some((pong_json, frame)) = &pong else {
            continue;
        };
        if !heartbeat.envelope.is_ping() {
            continue;
        }
        match conn.write_frame(frame, config.write_timeout).await {
            Ok(_) => {
                sent += 1;
                log.push_text(pong_json.clone());
            }
            Err(e) => {
                tracing::warn!(peer = %heartbeat.peer, error = %e, "Failed to send pong");
                log.push_text(format!("heartbeat {}: {}", heartbeat.peer, e));
            }
        }
    }
    sent
}

/// Close and remove every connection still awaiting a reply.
pub(crate) async fn evict_phase(state: &mut NodeState) -> Vec<SocketAddr> {
    let evicted = state.registry.awaiting_reply();
    for addr in &evicted {
        let Some(conn) = state.registry.remove(addr) else {
            continue;
        };
        tracing::info!(peer = %addr, "Evicting unresponsive peer");
        state.log.push_text(format!("removing {}", conn.snapshot()));
        state.close_connection(conn).await;
    }
    evicted
}

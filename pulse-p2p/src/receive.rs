//! Receive loop: polls every connection without blocking and routes what
//! arrives.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::P2pResult;
use crate::message_log::MessageLog;
use crate::peer::ReadOutcome;
use crate::protocol::Envelope;
use crate::shared::{InboundHeartbeat, NodeState, Shared};

/// Poll all connections every `recv_interval` until shutdown.
pub(crate) async fn run_receive_loop(shared: Arc<Shared>) {
    let config = &shared.config;

    while !shared.shutdown.is_closing() {
        {
            let mut state = shared.state.lock().await;
            poll_connections(&mut state, config.max_read_size);
        }
        if !shared.shutdown.sleep(config.recv_interval).await {
            break;
        }
    }

    tracing::debug!("Receive loop stopped");
}

/// One polling pass over the registry. Returns the number of connections
/// that had data.
pub(crate) fn poll_connections(state: &mut NodeState, max_read_size: usize) -> usize {
    let NodeState {
        registry,
        log,
        heartbeat_queue,
    } = state;

    let mut active = 0;
    for conn in registry.iter_mut() {
        let addr = conn.addr();
        let frames = match conn.try_read_frames(max_read_size) {
            Ok(ReadOutcome::Idle) => continue,
            Ok(ReadOutcome::Frames(frames)) => frames,
            Err(e) => {
                tracing::warn!(peer = %addr, error = %e, "Read error");
                log.push_text(format!("recv {}: {}", addr, e));
                continue;
            }
        };

        // Any inbound bytes prove liveness.
        if conn.mark_alive() {
            tracing::debug!(peer = %addr, "Peer active again");
        }
        active += 1;

        for frame in frames {
            route_frame(frame, addr, log, heartbeat_queue);
        }
    }
    active
}

fn route_frame(
    frame: P2pResult<String>,
    addr: SocketAddr,
    log: &mut MessageLog,
    heartbeat_queue: &mut VecDeque<InboundHeartbeat>,
) {
    let raw = match frame {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(peer = %addr, error = %e, "Dropping bad frame");
            log.push_text(format!("recv {}: {}", addr, e));
            return;
        }
    };

    match Envelope::from_json(&raw) {
        Ok(envelope) if envelope.is_heartbeat() => {
            tracing::trace!(peer = %addr, "Received heartbeat");
            log.push_payload(raw.clone(), addr);
            heartbeat_queue.push_back(InboundHeartbeat {
                peer: addr,
                raw,
                envelope,
            });
        }
        Ok(envelope) => {
            tracing::debug!(peer = %addr, envelope = %envelope, "Received envelope");
            log.push_payload(raw, addr);
        }
        Err(e) => {
            tracing::debug!(peer = %addr, error = %e, "Malformed payload");
            log.push_text(format!("recv {}: malformed payload: {}", addr, e));
        }
    }
}

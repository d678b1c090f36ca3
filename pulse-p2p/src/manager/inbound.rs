//! Inbound connection listener and accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{lookup_host, TcpListener, TcpSocket, TcpStream};

use crate::config::P2pConfig;
use crate::error::{P2pError, P2pResult};
use crate::peer::{Connection, ConnectionDirection};
use crate::protocol::Envelope;
use crate::shared::Shared;

/// Resolve `host:port` to the first address the resolver returns.
pub async fn resolve(host: &str, port: u16) -> P2pResult<SocketAddr> {
    lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| P2pError::Unresolvable {
            host: host.to_string(),
            port,
        })
}

/// Bind the listening socket with the configured backlog.
pub async fn bind_listener(config: &P2pConfig) -> P2pResult<TcpListener> {
    let addr = resolve(&config.host, config.port).await?;
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    #[cfg(unix)]
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(config.listen_backlog)?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, backlog = config.listen_backlog, "Listening for inbound connections");
    Ok(listener)
}

/// Accept connections until shutdown, then hand the listener back so the
/// caller decides when it closes.
pub(crate) async fn run_accept_loop(shared: Arc<Shared>, listener: TcpListener) -> TcpListener {
    let pacing = shared.config.accept_pacing;

    while !shared.shutdown.is_closing() {
        let accepted = tokio::select! {
            _ = shared.shutdown.wait() => break,
            result = listener.accept() => result,
        };

        match accepted {
            Ok((stream, addr)) => {
                if shared.shutdown.is_closing() {
                    tracing::debug!(addr = %addr, "Dropping connection accepted during shutdown");
                    break;
                }
                admit(&shared, stream, addr).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Accept error");
                shared.state.lock().await.log.push_text(format!("accept: {}", e));
            }
        }

        if !pacing.is_zero() && !shared.shutdown.sleep(pacing).await {
            break;
        }
    }

    tracing::debug!("Accept loop stopped");
    listener
}

/// Register an accepted stream and greet the peer.
async fn admit(shared: &Shared, stream: TcpStream, addr: SocketAddr) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::warn!(addr = %addr, error = %e, "Failed to set TCP_NODELAY");
    }
    tracing::info!(addr = %addr, "Accepted inbound connection");

    let config = &shared.config;
    let greeting = Envelope::greeting(&shared.hostname);

    let mut state = shared.state.lock().await;
    state
        .register(Connection::new(
            addr,
            stream,
            ConnectionDirection::Inbound,
            config.max_frame_size,
        ))
        .await;
    state.log.push_payload("received connection", addr);

    let sent = match state.registry.get_mut(&addr) {
        Some(conn) => conn.send(&greeting, config.write_timeout).await,
        None => return,
    };
    if let Err(e) = sent {
        tracing::warn!(addr = %addr, error = %e, "Failed to send greeting");
        state.log.push_text(format!("greeting {}: {}", addr, e));
    }
}

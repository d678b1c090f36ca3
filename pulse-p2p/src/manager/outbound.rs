//! Outbound connection establishment.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{P2pError, P2pResult};

/// Dial `host:port`, giving up after `connect_timeout`.
pub async fn dial(host: &str, port: u16, connect_timeout: Duration) -> P2pResult<TcpStream> {
    tracing::debug!(host = %host, port, "Connecting to peer");

    let stream = match timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(P2pError::Io(e)),
        Err(_) => {
            return Err(P2pError::ConnectionTimeout {
                addr: format!("{}:{}", host, port),
            })
        }
    };

    if let Err(e) = stream.set_nodelay(true) {
        tracing::warn!(host = %host, port, error = %e, "Failed to set TCP_NODELAY");
    }
    Ok(stream)
}

//! Process signal handling.

use std::io;

/// Wait for a shutdown signal (SIGINT or SIGTERM).
pub async fn wait_for_shutdown_signal() -> io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, initiating shutdown...");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }

    Ok(())
}

/// Like [`wait_for_shutdown_signal`], but never resolves if the handlers
/// cannot be installed.
pub async fn shutdown_signal() {
    if let Err(e) = wait_for_shutdown_signal().await {
        tracing::warn!(error = %e, "Failed to install signal handlers");
        std::future::pending::<()>().await;
    }
}

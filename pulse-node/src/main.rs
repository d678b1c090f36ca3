//! Pulse node binary.
//!
//! Starts a peer node on the given port and runs the interactive prompt.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use pulse_node::cli::Cli;
use pulse_node::config::NodeConfig;
use pulse_node::{prompt, shutdown};
use pulse_p2p::PeerNode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up logging; stderr keeps the prompt on stdout readable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::info!("Pulse Node v{}", env!("CARGO_PKG_VERSION"));

    // Build configuration
    let config = NodeConfig::from_cli(&cli);

    let node = PeerNode::start(config.p2p_config())
        .await
        .with_context(|| format!("failed to listen on {}:{}", config.host, config.port))?;

    for peer in &config.bootstrap_peers {
        if let Err(e) = node.connect(&peer.host, peer.port).await {
            tracing::warn!(peer = %peer, error = %e, "Bootstrap peer unreachable");
        }
    }

    let input = prompt::spawn_stdin_reader();
    let mut stdout = std::io::stdout();
    let result = prompt::run(&node, input, &mut stdout, shutdown::shutdown_signal()).await;

    node.close().await?;
    result
}

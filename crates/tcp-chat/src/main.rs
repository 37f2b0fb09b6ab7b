//! TCP chat server.
//!
//! Usage: tcp-chat [PORT]

use clap::Parser;
use tcp_chat::config::{ServerConfig, DEFAULT_PORT};
use tcp_chat::ChatServer;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tcp-chat", version, about = "Line-oriented TCP chat server")]
#[command(override_usage = "tcp-chat [PORT]")]
struct Cli {
    /// Port to listen on
    #[arg(value_name = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Argument errors print usage and exit before anything is bound.
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::with_port(cli.port.unwrap_or(DEFAULT_PORT));
    let server = ChatServer::bind(&config).await?;

    server
        .run_until(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::warn!(%error, "failed to listen for ctrl+c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("Shutting down");
    Ok(())
}

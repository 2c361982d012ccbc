//! Parley REST API and SSE entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes the database and services, spawns the
//! push-connection heartbeat, and serves the HTTP API until shutdown.

mod http;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use state::AppState;

/// Conversation-persistence and live-notification service.
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// HTTP listen port (overrides config.toml).
    #[arg(long, env = "PARLEY_PORT")]
    port: Option<u16>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "info,parley=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let state = AppState::init().await?;
    let port = cli.port.unwrap_or(state.config.port);

    // Keep-alive loop so idle network intermediaries do not close push
    // connections.
    let heartbeat = std::time::Duration::from_secs(state.config.heartbeat_seconds);
    tokio::spawn(state.hub.clone().run_heartbeat(heartbeat));

    let router = http::router::build_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "parley listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

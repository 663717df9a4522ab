//! Waves Binary Entry Point
//!
//! This binary runs the waves HTTP API.
//! Core functionality is provided by the `waves` library crate.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waves::{StorageBuilder, config::AppConfig, server};

/// Waves - CRUD API for dated, named records
#[derive(Parser, Debug)]
#[command(name = "waves", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults are used if it does not exist)
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "WAVES_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, env = "WAVES_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "WAVES_SERVER_PORT")]
    server_port: Option<u16>,

    /// Database connection string (overrides config file)
    #[arg(long, env = "WAVES_DB_URL")]
    db_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,waves=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Waves - CRUD API");

    let cli = Cli::parse();

    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load_or_default(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    if let Some(conn) = cli.db_url {
        config.database.connection_string = conn;
    }
    config.validate()?;

    tracing::info!(
        "Server: {}:{}, Database: {}",
        config.server.bind,
        config.server.port,
        config.database.connection_string,
    );

    // Build storage layer
    let db_url = config.database.connection_url();
    tracing::info!("Initializing storage at: {}", db_url);

    let handles = StorageBuilder::new(db_url)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .build()
        .await?;

    tracing::info!("Storage initialized");

    let addr = config.server.socket_addr()?;

    tracing::info!("Web server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::serve(listener, handles, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve once Ctrl+C or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}

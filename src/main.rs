//! Request logger demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌──────────────────────────────────────────────┐
//!     ───────────────────┼─▶ RequestLoggingLayer ─▶ Timeout ─▶ handler │
//!                        │        │                              │      │
//!                        │        ▼                              ▼      │
//!                        │  scoped Logger ◀──── RequestLogger extractor │
//!                        │        │                                     │
//!                        │        ▼                                     │
//!                        │  JSON lines on stdout                        │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! Request records go to stdout as JSON lines; the server's own diagnostics
//! go to stderr through `tracing`.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use request_logger::config::{load_config, ServiceConfig};
use request_logger::http::HttpServer;
use request_logger::logging;

#[derive(Parser)]
#[command(name = "request-logger")]
#[command(about = "Demo HTTP server with request-scoped JSON logging", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum level for request logs (overrides the config file).
    #[arg(short, long)]
    level: Option<String>,

    /// Bind address (overrides the config file).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "request_logger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(level) = cli.level {
        config.logging.level = level;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    let logger = logging::init(&config.logging)?;
    if logging::set_default_logger(logger.clone()).is_err() {
        tracing::warn!("Default logger was already initialized");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        level = %logger.level(),
        request_timeout_secs = config.listener.request_timeout_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, logger);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! HTTP Request Logger (v1)
//!
//! A small HTTP server built with Tokio and Axum that records one structured
//! event per request and answers with a JSON acknowledgment.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────────────┐
//!                     │                     REQUEST LOGGER                         │
//!                     │                                                            │
//!   Client Request    │  ┌─────────┐    ┌──────────┐    ┌──────────────┐           │
//!   ──────────────────┼─▶│  axum   │───▶│ dispatch │───▶│ route table  │           │
//!                     │  │ serve   │    │          │    │ + 405 policy │           │
//!                     │  └─────────┘    └──────────┘    └──────┬───────┘           │
//!                     │                                        │                   │
//!                     │                                        ▼                   │
//!                     │                 ┌──────────┐    ┌──────────────┐           │
//!                     │                 │ request  │◀───│   handler    │           │
//!                     │                 │normalizer│    │ get/post/... │           │
//!                     │                 └────┬─────┘    └──────┬───────┘           │
//!                     │                      ▼                 │                   │
//!                     │                 ┌──────────┐           │                   │
//!                     │                 │request   │           │                   │
//!                     │                 │log sink  │           │                   │
//!                     │                 └──────────┘           ▼                   │
//!   Client Response   │                               ┌──────────────┐             │
//!   ◀─────────────────┼───────────────────────────────│ JSON payload │             │
//!                     │                               └──────────────┘             │
//!                     └────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use request_logger::config::resolve_config;
use request_logger::lifecycle::{spawn_signal_handler, startup, Shutdown};
use request_logger::observability::init_tracing;

#[derive(Parser)]
#[command(name = "request-logger")]
#[command(about = "HTTP server that logs every request as a structured event", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Configuration errors are reported before logging exists
    let config = resolve_config(cli.config.as_deref())?;

    init_tracing(&config.observability)?;

    tracing::info!("request-logger v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.limits.max_body_bytes,
        request_timeout_secs = config.limits.request_timeout_secs,
        request_log = ?config.observability.request_log,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    if let Err(e) = startup::run(config, shutdown).await {
        tracing::error!(error = %e, "Server failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind the listener and begin accepting traffic
//! - Flush the request log once the server has stopped
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The request log outlives the server so the last events are not lost

use thiserror::Error;

use crate::config::ServerConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::observability::{metrics, RequestLog};
use crate::routing::RouteTable;

/// Errors that prevent the server from starting or keep it from running.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Start every subsystem and serve until `shutdown` is triggered.
pub async fn run(config: ServerConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let request_log = RequestLog::from_config(config.observability.request_log);
    run_with_log(config, request_log, shutdown).await
}

/// Same as [`run`] with an explicit request log.
pub async fn run_with_log(
    config: ServerConfig,
    request_log: RequestLog,
    shutdown: Shutdown,
) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address)?;
    }

    let server = HttpServer::new(config, request_log.clone());
    let listener = server.bind().await?;
    log_endpoints(server.routes());

    let result = server.run(listener, shutdown.subscribe()).await;

    request_log.flush();
    tracing::info!("Request log flushed");
    Ok(result?)
}

fn log_endpoints(routes: &RouteTable) {
    for route in routes.routes() {
        tracing::info!(method = %route.methods, path = route.path, "Endpoint registered");
    }
    tracing::info!(method = "ANY", path = "/*", "Welcome handler for unmatched paths");
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `requests_total` (counter): requests by route, method, status
//! - `request_duration_seconds` (histogram): handling latency by route
//!
//! # Design Decisions
//! - Recorded once per request by the dispatcher
//! - Without an installed recorder the macros are no-ops
//! - Prometheus exporter is opt-in

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled request.
pub fn record_request(route: &'static str, method: &str, status: u16, start: Instant) {
    let labels = [
        ("route", route.to_string()),
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("requests_total", &labels).increment(1);
    metrics::histogram!("request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

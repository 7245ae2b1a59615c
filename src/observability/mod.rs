//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handlers produce:
//!     → logging.rs (one structured event per logged request)
//!     → metrics.rs (counters, histograms)
//!
//! Everything else produces:
//!     → tracing subscriber (startup, shutdown, HTTP traces)
//!
//! Consumers:
//!     → Log aggregation (stdout request events, stderr operational log)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request events are JSON lines for machine parsing
//! - Health probes never reach the request log
//! - Metrics are cheap (no-ops when no recorder is installed)

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, JsonLineSink, LogSink, MemorySink, RequestLog, TracingSink};

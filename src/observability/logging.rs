//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the operational log (tracing subscriber)
//! - Emit one structured event per logged request
//! - Flush buffered request events at shutdown
//!
//! # Design Decisions
//! - Operational logs go to stderr through `tracing`; request events are a
//!   separate stream with their own sink
//! - `RequestLog` is an explicit handle shared through application state,
//!   never a global
//! - Emission is best-effort: sink failures are swallowed

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, ObservabilityConfig, RequestLogSink};
use crate::http::request::CanonicalRequestRecord;

/// Message attached to every request event.
pub const REQUEST_EVENT_MSG: &str = "request received";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{},tower_http=debug", config.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init(),
    }
}

/// Destination for request events.
///
/// Implementations must tolerate concurrent calls from many handlers.
pub trait LogSink: Send + Sync {
    /// Write one event for `record`. Failures are not reported.
    fn emit(&self, record: &CanonicalRequestRecord);

    /// Push any buffered events to their destination.
    fn flush(&self) {}
}

/// Cloneable handle to the request event sink.
#[derive(Clone)]
pub struct RequestLog {
    sink: Arc<dyn LogSink>,
}

impl RequestLog {
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Build the sink selected in the configuration.
    pub fn from_config(kind: RequestLogSink) -> Self {
        match kind {
            RequestLogSink::Json => Self::new(JsonLineSink::new(io::stdout())),
            RequestLogSink::Tracing => Self::new(TracingSink),
        }
    }

    /// Emit the event for one request.
    pub fn log(&self, record: &CanonicalRequestRecord) {
        self.sink.emit(record);
    }

    pub fn flush(&self) {
        self.sink.flush();
    }
}

impl std::fmt::Debug for RequestLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLog").finish_non_exhaustive()
    }
}

/// Envelope written by [`JsonLineSink`].
#[derive(Serialize)]
struct JsonLine<'a> {
    level: &'static str,
    ts: f64,
    msg: &'static str,
    #[serde(flatten)]
    record: &'a CanonicalRequestRecord,
}

/// Writes each event as one JSON line.
///
/// Each line is serialized first and handed to the writer in a single
/// `write_all` under the lock, so concurrent events never interleave.
pub struct JsonLineSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> LogSink for JsonLineSink<W> {
    fn emit(&self, record: &CanonicalRequestRecord) {
        let line = JsonLine {
            level: "info",
            ts: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
            msg: REQUEST_EVENT_MSG,
            record,
        };
        let Ok(mut bytes) = serde_json::to_vec(&line) else {
            return;
        };
        bytes.push(b'\n');

        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        if writer.write_all(&bytes).is_err() {
            tracing::debug!("request log write failed");
        }
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

/// Routes events through the tracing subscriber on target `request_log`.
///
/// Nested maps are rendered as JSON text since tracing fields are flat.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: &CanonicalRequestRecord) {
        let headers = serde_json::to_string(&record.headers).unwrap_or_default();
        let query_params = serde_json::to_string(&record.query_params).unwrap_or_default();
        let body = if record.body.is_absent() {
            None
        } else {
            serde_json::to_string(&record.body).ok()
        };

        tracing::info!(
            target: "request_log",
            id = %record.id,
            timestamp = %record.timestamp,
            method = %record.method,
            path = %record.path,
            ip = %record.ip,
            headers = %headers,
            query_params = %query_params,
            body = body.as_deref(),
            "{}",
            REQUEST_EVENT_MSG
        );
    }
}

/// Keeps events in memory; used to inspect what handlers logged.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<CanonicalRequestRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event emitted so far.
    pub fn records(&self) -> Vec<CanonicalRequestRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &CanonicalRequestRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

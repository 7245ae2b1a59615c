//! Request capture and normalization.
//!
//! # Responsibilities
//! - Capture the inbound request (method, path, client address, headers, query, body)
//! - Generate a unique request ID from a nanosecond clock reading
//! - Flatten headers and query parameters (first value wins)
//! - Decode the body best-effort: JSON, else text, else absent
//!
//! # Design Decisions
//! - Normalization never mutates the captured request
//! - Body read failures stop the pipeline before normalization
//! - IDs are monotonic within a process; not unique across restarts

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};

use axum::body::{Body, Bytes};
use axum::http::{header, request::Parts, HeaderMap, Method};
use chrono::{DateTime, SecondsFormat, Utc};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use thiserror::Error;

/// Raised when the request body cannot be read from the transport.
#[derive(Debug, Error)]
#[error("failed to read request body: {0}")]
pub struct BodyReadError(#[from] axum::Error);

/// Percent-decode a URI path; invalid UTF-8 sequences are replaced.
pub fn decoded_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Read the whole request body, up to `limit` bytes.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, BodyReadError> {
    Ok(axum::body::to_bytes(body, limit).await?)
}

/// The request as delivered by the transport, owned for the duration of one call.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    /// Client address as `ip:port`.
    pub remote_addr: String,
    pub headers: HeaderMap,
    /// Decoded query pairs in the order they were sent.
    pub query: Vec<(String, String)>,
    /// Raw body bytes. Only read for endpoints that accept a body.
    pub body: Option<Bytes>,
}

impl InboundRequest {
    /// Capture a request from its head, the client address and an
    /// already-read body.
    pub fn from_parts(parts: &Parts, remote_addr: SocketAddr, body: Option<Bytes>) -> Self {
        let query: Vec<(String, String)> = parts
            .uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            method: parts.method.clone(),
            path: decoded_path(parts.uri.path()),
            remote_addr: remote_addr.to_string(),
            headers: parts.headers.clone(),
            query,
            body,
        }
    }

    /// Query parameters grouped by name, keeping every value.
    pub fn query_multimap(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in &self.query {
            map.entry(key.clone()).or_default().push(value.clone());
        }
        map
    }

    /// First `Content-Type` value, or an empty string.
    pub fn content_type(&self) -> String {
        self.headers
            .get(header::CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default()
    }

    /// Length of the captured body in bytes.
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }
}

/// Identifier of a logged request: Unix time in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(i64);

impl RequestId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RequestId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Generates request IDs from the wall clock at nanosecond resolution.
///
/// Readings that do not advance past the previous ID are bumped by one
/// nanosecond, so IDs handed out by one generator are strictly increasing.
#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    last: AtomicI64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// ID for a request observed at `now`.
    pub fn next_id(&self, now: DateTime<Utc>) -> RequestId {
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp().saturating_mul(1_000_000_000));

        let previous = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(nanos.max(last.saturating_add(1)))
            }) {
            Ok(prev) | Err(prev) => prev,
        };
        RequestId(nanos.max(previous.saturating_add(1)))
    }
}

/// Best-effort decoded request body.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum RequestBody {
    #[default]
    Absent,
    Json(serde_json::Value),
    Text(String),
}

impl RequestBody {
    /// Decode raw bytes: empty is absent, valid JSON is kept as a value,
    /// anything else is taken as text.
    pub fn decode(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return RequestBody::Absent;
        }
        match serde_json::from_slice(raw) {
            Ok(value) => RequestBody::Json(value),
            Err(_) => RequestBody::Text(String::from_utf8_lossy(raw).into_owned()),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, RequestBody::Absent)
    }
}

/// Normalized, flattened view of a request used for logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRequestRecord {
    pub id: RequestId,
    pub timestamp: String,
    pub method: String,
    pub path: String,
    pub ip: String,
    pub headers: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "RequestBody::is_absent")]
    pub body: RequestBody,
}

/// Build the canonical record for `request`, stamped with the current time.
pub fn normalize(request: &InboundRequest, ids: &RequestIdGenerator) -> CanonicalRequestRecord {
    normalize_at(request, ids, Utc::now())
}

/// Same as [`normalize`] with an explicit clock reading.
pub fn normalize_at(
    request: &InboundRequest,
    ids: &RequestIdGenerator,
    now: DateTime<Utc>,
) -> CanonicalRequestRecord {
    CanonicalRequestRecord {
        id: ids.next_id(now),
        timestamp: rfc3339(now),
        method: request.method.as_str().to_string(),
        path: request.path.clone(),
        ip: request.remote_addr.clone(),
        headers: flatten_headers(&request.headers),
        query_params: flatten_pairs(&request.query),
        body: request
            .body
            .as_deref()
            .map(RequestBody::decode)
            .unwrap_or_default(),
    }
}

/// RFC3339 at second precision, UTC designator `Z`.
pub fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    // `HeaderMap::get` returns the first value sent under a name.
    headers
        .keys()
        .filter_map(|name| {
            headers.get(name).map(|value| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
        })
        .collect()
}

fn flatten_pairs(pairs: &[(String, String)]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (key, value) in pairs {
        map.entry(key.clone()).or_insert_with(|| value.clone());
    }
    map
}

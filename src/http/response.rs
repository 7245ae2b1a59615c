//! Response payloads and builders.
//!
//! # Responsibilities
//! - Define the JSON body of every route
//! - Map handler outcomes to status codes
//!
//! # Design Decisions
//! - Every payload is a typed struct; field order is the wire order
//! - All bodies are JSON except the body-read failure, which is plain text

use std::collections::BTreeMap;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const GET_MESSAGE: &str = "GET request received successfully";
pub const POST_MESSAGE: &str = "POST request received successfully";
pub const WELCOME_MESSAGE: &str = "Welcome to the Go Web Server";
pub const WELCOME_HINT: &str = "Try /get, /post, or /health endpoints";
pub const HEALTHY: &str = "healthy";
pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const BODY_READ_ERROR: &str = "Error reading request body";

/// Body of `GET /get`.
#[derive(Debug, Serialize)]
pub struct GetAck {
    pub message: &'static str,
    pub path: String,
    pub query: BTreeMap<String, Vec<String>>,
    pub status_code: u16,
}

/// Body of `POST /post`.
#[derive(Debug, Serialize)]
pub struct PostAck {
    pub message: &'static str,
    pub path: String,
    pub body_length: usize,
    pub content_type: String,
    pub status_code: u16,
}

/// Body of `/health`.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub time: String,
}

/// Body of every unmatched path.
#[derive(Debug, Serialize)]
pub struct Welcome {
    pub message: &'static str,
    pub hint: &'static str,
}

impl Default for Welcome {
    fn default() -> Self {
        Self {
            message: WELCOME_MESSAGE,
            hint: WELCOME_HINT,
        }
    }
}

/// Structured error body.
#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub error: &'static str,
    pub status_code: u16,
}

/// 200 with a JSON body.
pub fn ok<T: Serialize>(payload: T) -> Response {
    (StatusCode::OK, Json(payload)).into_response()
}

/// 405 with the fixed error payload.
pub fn method_not_allowed() -> Response {
    let status = StatusCode::METHOD_NOT_ALLOWED;
    (
        status,
        Json(ErrorPayload {
            error: METHOD_NOT_ALLOWED,
            status_code: status.as_u16(),
        }),
    )
        .into_response()
}

/// 400 with a plain-text message.
pub fn bad_request_text(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        format!("{message}\n"),
    )
        .into_response()
}

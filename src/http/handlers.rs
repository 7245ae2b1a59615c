//! Endpoint handlers.
//!
//! Each handler runs after the dispatcher has resolved the route and
//! applied its method policy.

use std::net::SocketAddr;

use axum::{body::Body, http::Request, response::Response};
use chrono::Utc;

use crate::http::request::{normalize, read_body, rfc3339, InboundRequest};
use crate::http::response::{self, GetAck, HealthStatus, PostAck, Welcome};
use crate::http::server::AppState;
use crate::routing::Endpoint;

/// Run the handler for `endpoint`.
pub async fn handle(
    state: &AppState,
    endpoint: Endpoint,
    client: SocketAddr,
    request: Request<Body>,
) -> Response {
    match endpoint {
        Endpoint::Get => handle_get(state, client, request),
        Endpoint::Post => handle_post(state, client, request).await,
        Endpoint::Health => handle_health(),
        Endpoint::Welcome => handle_welcome(state, client, request),
    }
}

/// `GET /get`: log the request and echo its path and query.
fn handle_get(state: &AppState, client: SocketAddr, request: Request<Body>) -> Response {
    let (parts, _) = request.into_parts();
    let inbound = InboundRequest::from_parts(&parts, client, None);
    state.request_log.log(&normalize(&inbound, &state.ids));

    response::ok(GetAck {
        message: response::GET_MESSAGE,
        path: inbound.path.clone(),
        query: inbound.query_multimap(),
        status_code: 200,
    })
}

/// `POST /post`: read the body, log the request with it, report its size.
async fn handle_post(state: &AppState, client: SocketAddr, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match read_body(body, state.limits.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(client = %client, error = %e, "Rejecting request with unreadable body");
            return response::bad_request_text(response::BODY_READ_ERROR);
        }
    };

    let inbound = InboundRequest::from_parts(&parts, client, Some(bytes));
    state.request_log.log(&normalize(&inbound, &state.ids));

    response::ok(PostAck {
        message: response::POST_MESSAGE,
        path: inbound.path.clone(),
        body_length: inbound.body_len(),
        content_type: inbound.content_type(),
        status_code: 200,
    })
}

/// `/health`: never logged.
fn handle_health() -> Response {
    response::ok(HealthStatus {
        status: response::HEALTHY,
        time: rfc3339(Utc::now()),
    })
}

/// Any unmatched path: log the request and point at the real routes.
fn handle_welcome(state: &AppState, client: SocketAddr, request: Request<Body>) -> Response {
    let (parts, _) = request.into_parts();
    let inbound = InboundRequest::from_parts(&parts, client, None);
    state.request_log.log(&normalize(&inbound, &state.ids));

    response::ok(Welcome::default())
}

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, dispatch, 405 policy)
//!     → handlers.rs (per-endpoint behavior)
//!     → request.rs (capture, normalize, request ID)
//!     → [observability::logging emits the request event]
//!     → response.rs (JSON payloads, status codes)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{normalize, CanonicalRequestRecord, InboundRequest, RequestBody, RequestId};
pub use server::{AppState, HttpServer, ServerError};

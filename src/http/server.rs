//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatcher
//! - Wire up middleware (tracing, timeout)
//! - Bind server to listener
//! - Resolve each request against the route table and apply the 405 policy
//! - Hand matched requests to the endpoint handlers
//! - Observability (metrics per request)

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{LimitsConfig, ServerConfig};
use crate::http::handlers;
use crate::http::request::{decoded_path, RequestIdGenerator};
use crate::http::response;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::observability::RequestLog;
use crate::routing::{RouteMatch, RouteTable};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub request_log: RequestLog,
    pub ids: Arc<RequestIdGenerator>,
    pub limits: LimitsConfig,
}

/// HTTP server for the request logger.
pub struct HttpServer {
    router: Router,
    routes: Arc<RouteTable>,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server that writes request events to `request_log`.
    pub fn new(config: ServerConfig, request_log: RequestLog) -> Self {
        let routes = Arc::new(RouteTable::standard());
        let state = AppState {
            routes: Arc::clone(&routes),
            request_log,
            ids: Arc::new(RequestIdGenerator::new()),
            limits: config.limits.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            routes,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.limits.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router. Requires `ConnectInfo<SocketAddr>`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured listen address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = &self.config.listener.bind_address;
        TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The route table requests are dispatched through.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

/// Single entry point for every request.
/// Resolves the route, enforces its method policy, and runs the endpoint.
async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = decoded_path(request.uri().path());
    let route = state.routes.resolve(&method, &path);

    let response = match route {
        RouteMatch::MethodNotAllowed(endpoint) => {
            tracing::debug!(
                method = %method,
                path = %path,
                route = endpoint.label(),
                "Method not allowed"
            );
            response::method_not_allowed()
        }
        RouteMatch::Matched(endpoint) => handlers::handle(&state, endpoint, client, request).await,
    };

    metrics::record_request(
        route.endpoint().label(),
        method.as_str(),
        response.status().as_u16(),
        start_time,
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::RequestBody;
    use crate::observability::MemorySink;
    use axum::body::Bytes;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{header, HeaderMap, Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const CLIENT: ([u8; 4], u16) = ([127, 0, 0, 1], 4000);

    fn app_with(config: ServerConfig) -> (Router, MemorySink) {
        let sink = MemorySink::new();
        let server = HttpServer::new(config, RequestLog::new(sink.clone()));
        let app = server.router().layer(MockConnectInfo(SocketAddr::from(CLIENT)));
        (app, sink)
    }

    fn app() -> (Router, MemorySink) {
        app_with(ServerConfig::default())
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    fn request(method: Method, uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn get_echoes_path_and_query() {
        let (app, sink) = app();

        let (status, headers, body) = send(app, request(Method::GET, "/get?x=1", Body::empty())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            &body[..],
            br#"{"message":"GET request received successfully","path":"/get","query":{"x":["1"]},"status_code":200}"#
        );

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, "GET");
        assert_eq!(records[0].path, "/get");
        assert_eq!(records[0].ip, "127.0.0.1:4000");
        assert_eq!(records[0].query_params["x"], "1");
        assert_eq!(records[0].body, RequestBody::Absent);
    }

    #[tokio::test]
    async fn get_keeps_every_query_value_in_response() {
        let (app, sink) = app();

        let (_, _, body) = send(app, request(Method::GET, "/get?x=1&x=2&y=", Body::empty())).await;

        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["query"], json!({"x": ["1", "2"], "y": [""]}));
        assert_eq!(sink.records()[0].query_params["x"], "1");
    }

    #[tokio::test]
    async fn get_route_rejects_other_methods() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
            let (app, sink) = app();
            let (status, headers, body) =
                send(app, request(method.clone(), "/get?x=1", "ignored")).await;

            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_eq!(headers[header::CONTENT_TYPE], "application/json");
            if method != Method::HEAD {
                let body: Value = serde_json::from_slice(&body).unwrap();
                assert_eq!(body, json!({"error": "Method Not Allowed", "status_code": 405}));
            }
            assert!(sink.records().is_empty(), "{method} must not be logged");
        }
    }

    #[tokio::test]
    async fn method_check_is_case_sensitive() {
        let (app, _) = app();
        let lowercase = Method::from_bytes(b"get").unwrap();

        let (status, _, _) = send(app, request(lowercase, "/get", Body::empty())).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn post_route_rejects_other_methods() {
        for method in [Method::GET, Method::PUT, Method::DELETE, Method::OPTIONS] {
            let (app, sink) = app();
            let (status, _, body) = send(app, request(method.clone(), "/post", Body::empty())).await;

            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
            let body: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(body, json!({"error": "Method Not Allowed", "status_code": 405}));
            assert!(sink.records().is_empty());
        }
    }

    #[tokio::test]
    async fn post_json_body_is_logged_as_value() {
        let (app, sink) = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/post")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"foo":"bar"}"#))
            .unwrap();

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            &body[..],
            br#"{"message":"POST request received successfully","path":"/post","body_length":13,"content_type":"application/json","status_code":200}"#
        );

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body, RequestBody::Json(json!({"foo": "bar"})));
    }

    #[tokio::test]
    async fn post_text_body_is_logged_as_text() {
        let (app, sink) = app();

        let (status, _, body) = send(app, request(Method::POST, "/post", "not { json")).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["body_length"], 10);
        assert_eq!(body["content_type"], "");
        assert_eq!(
            sink.records()[0].body,
            RequestBody::Text("not { json".to_string())
        );
    }

    #[tokio::test]
    async fn post_empty_body_has_no_logged_body() {
        let (app, sink) = app();

        let (status, _, body) = send(app, request(Method::POST, "/post", Body::empty())).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["body_length"], 0);

        let logged = serde_json::to_value(&sink.records()[0]).unwrap();
        assert!(logged.get("body").is_none());
    }

    #[tokio::test]
    async fn oversized_body_is_a_bad_request_and_not_logged() {
        let mut config = ServerConfig::default();
        config.limits.max_body_bytes = 4;
        let (app, sink) = app_with(config);

        let (status, headers, body) =
            send(app, request(Method::POST, "/post", "more than four bytes")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(&body[..], b"Error reading request body\n");
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn health_is_stable_and_not_logged() {
        let (app, sink) = app();

        for method in [Method::GET, Method::GET, Method::POST] {
            let (status, _, body) = send(app.clone(), request(method, "/health", Body::empty())).await;
            assert_eq!(status, StatusCode::OK);

            let body: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(body["status"], "healthy");
            let time = body["time"].as_str().unwrap();
            assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
        }
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn unknown_path_gets_welcome() {
        let (app, sink) = app();

        let (status, _, body) =
            send(app, request(Method::DELETE, "/unknown-path?debug=1", Body::empty())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            &body[..],
            br#"{"message":"Welcome to the Go Web Server","hint":"Try /get, /post, or /health endpoints"}"#
        );
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, "DELETE");
        assert_eq!(records[0].path, "/unknown-path");
        assert_eq!(records[0].query_params["debug"], "1");
    }

    #[tokio::test]
    async fn root_and_trailing_slash_fall_through() {
        for uri in ["/", "/get/"] {
            let (app, _) = app();
            let (status, _, body) = send(app, request(Method::GET, uri, Body::empty())).await;
            assert_eq!(status, StatusCode::OK);
            let body: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(body["message"], "Welcome to the Go Web Server", "{uri}");
        }
    }

    #[tokio::test]
    async fn welcome_never_reads_the_body() {
        let (app, sink) = app();

        send(app, request(Method::POST, "/submit", r#"{"a":1}"#)).await;

        assert_eq!(sink.records()[0].body, RequestBody::Absent);
    }

    #[tokio::test]
    async fn repeated_header_logs_first_value() {
        let (app, sink) = app();
        let request = Request::builder()
            .uri("/get")
            .header("x-token", "a")
            .header("x-token", "b")
            .body(Body::empty())
            .unwrap();

        send(app, request).await;

        assert_eq!(sink.records()[0].headers["x-token"], "a");
    }

    #[tokio::test]
    async fn back_to_back_requests_get_distinct_ids() {
        let (app, sink) = app();

        send(app.clone(), request(Method::GET, "/get", Body::empty())).await;
        send(app, request(Method::GET, "/get", Body::empty())).await;

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].id, records[1].id);
        assert!(records[0].id < records[1].id);
    }

    #[tokio::test]
    async fn encoded_path_is_routed_decoded() {
        let (app, sink) = app();

        let (status, _, body) = send(app, request(Method::GET, "/g%65t?x=1", Body::empty())).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "GET request received successfully");
        assert_eq!(body["path"], "/get");
        assert_eq!(sink.records()[0].path, "/get");
    }

    #[tokio::test]
    async fn encoded_path_is_logged_decoded() {
        let (app, sink) = app();

        let (status, _, body) = send(app, request(Method::GET, "/foo%20bar", Body::empty())).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Welcome to the Go Web Server");
        assert_eq!(sink.records()[0].path, "/foo bar");
    }

    #[tokio::test]
    async fn encoded_post_path_keeps_method_policy() {
        let (app, sink) = app();

        let (status, _, _) = send(app, request(Method::GET, "/p%6Fst", Body::empty())).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn exposes_the_dispatch_table() {
        let server = HttpServer::new(ServerConfig::default(), RequestLog::new(MemorySink::new()));

        let paths: Vec<_> = server.routes().routes().iter().map(|r| r.path).collect();
        assert_eq!(paths, ["/get", "/post", "/health"]);
    }
}

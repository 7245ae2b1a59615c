//! Shared utilities for integration testing.

use std::net::SocketAddr;

use request_logger::http::ServerError;
use request_logger::observability::MemorySink;
use request_logger::{HttpServer, RequestLog, ServerConfig, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server running on an ephemeral port, logging into memory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub sink: MemorySink,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let sink = MemorySink::new();
        let server = HttpServer::new(config, RequestLog::new(sink.clone()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        let handle = tokio::spawn(async move { server.run(listener, signal).await });

        Self {
            addr,
            sink,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}

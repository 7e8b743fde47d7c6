//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use origin_guard::config::GuardConfig;
use origin_guard::http::HttpServer;
use origin_guard::lifecycle::Shutdown;
use origin_guard::security::SharedAllowList;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub allow_list: SharedAllowList,
    #[allow(dead_code)]
    pub config_updates: mpsc::UnboundedSender<GuardConfig>,
    shutdown: Shutdown,
}

impl TestServer {
    pub async fn start(config: GuardConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = HttpServer::new(config).unwrap();
        let allow_list = server.allow_list();
        let (config_updates, rx) = mpsc::unbounded_channel();
        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();

        tokio::spawn(async move {
            let _ = server.run(listener, rx, server_shutdown).await;
        });

        Self {
            addr,
            allow_list,
            config_updates,
            shutdown,
        }
    }

    /// Handshake request for `/ws`, optionally carrying an Origin header.
    pub fn ws_request(&self, origin: Option<&'static str>) -> Request {
        let mut req = format!("ws://{}/ws", self.addr).into_client_request().unwrap();
        if let Some(origin) = origin {
            req.headers_mut().insert("origin", HeaderValue::from_static(origin));
        }
        req
    }

    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Poll `check` until it returns true or the timeout elapses.
#[allow(dead_code)]
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

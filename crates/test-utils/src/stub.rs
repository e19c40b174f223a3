//! In-process stand-in for the backend REST API.
//!
//! Tests build an `axum::Router` with the routes they need and hand it to
//! [`StubBackend::start`], which serves it on an ephemeral local port.

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct StubBackend {
    base_url: String,
    handle: JoinHandle<()>,
}

impl StubBackend {
    /// Serve `app` on `127.0.0.1:0` until the stub is dropped.
    pub async fn start(app: Router) -> Self {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(listener) => listener,
            Err(e) => panic!("failed to bind stub backend: {}", e),
        };
        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => panic!("stub backend has no local address: {}", e),
        };
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{}", addr),
            handle,
        }
    }

    /// Base URL without a trailing slash, e.g. `http://127.0.0.1:41234`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

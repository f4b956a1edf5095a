//! Mock exchange REST API for integration tests.
//!
//! Provides a simple HTTP server that can:
//! - Answer `/api/*` calls from a scripted status/body queue
//! - Accept metrics sink pushes on any other path
//! - Record every request it receives

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[derive(Clone, Default)]
struct MockState {
    responses: Arc<Mutex<VecDeque<(u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// A mock exchange server for testing.
pub struct MockExchange {
    addr: SocketAddr,
    state: MockState,
    shutdown_tx: mpsc::Sender<()>,
}

impl MockExchange {
    /// Start a new mock exchange on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = MockState::default();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let app = Router::new().fallback(handle).with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    /// Base URL for the exchange config.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Metrics sink URL on the same server, with Basic auth userinfo.
    pub fn sink_url(&self) -> String {
        format!("http://user:pass@{}/sink", self.addr)
    }

    /// Queue the next `/api/*` response. Unscripted calls get `200`.
    pub fn push_response(&self, status: u16, body: &str) {
        self.state
            .responses
            .lock()
            .push_back((status, body.to_string()));
    }

    /// Requests received on paths starting with `prefix`.
    pub fn requests(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    state.requests.lock().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        body,
    });

    if !path.starts_with("/api/") {
        return (StatusCode::OK, String::new());
    }

    let (status, body) = state
        .responses
        .lock()
        .pop_front()
        .unwrap_or_else(|| (200, r#"{"success":true}"#.to_string()));
    (StatusCode::from_u16(status).unwrap(), body)
}

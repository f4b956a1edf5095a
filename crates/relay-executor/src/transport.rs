//! Outbound HTTP transport for signed exchange requests.
//!
//! A trait seam so the retry loop can be driven by a scripted mock in tests
//! and by reqwest in production.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use tracing::debug;

use crate::error::{ExecutorError, ExecutorResult, TransportError};
use crate::signer::SignedHeaders;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// A signed request ready for transmission.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: String,
    pub path: String,
    pub body: String,
    pub headers: SignedHeaders,
}

/// Status and fully-read body of an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Trait for sending signed requests to the exchange.
///
/// Implementations must read the whole response body before returning.
pub trait Transport: Send + Sync {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>>;
}

/// reqwest-backed transport against a fixed base URL.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` (e.g. "https://ftx.com").
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> ExecutorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecutorError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_headers(headers: &SignedHeaders) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::new();
        for (name, value) in headers.to_pairs() {
            let value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidRequest(format!("invalid value for {name}")))?;
            map.insert(HeaderName::from_static(name), value);
        }
        Ok(map)
    }

    async fn execute(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let headers = Self::build_headers(&request.headers)?;
        let url = format!("{}{}", self.base_url, request.path);

        debug!(method = %method, path = %request.path, "Sending upstream request");

        let mut builder = self.client.request(method, &url).headers(headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        Ok(UpstreamResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>> {
        Box::pin(self.execute(request))
    }
}

/// Scripted transport for testing.
///
/// Returns queued results in order; once the script runs out it keeps
/// answering `200` with an empty body.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<UpstreamResponse, TransportError>>>,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers with the given statuses in order.
    pub fn with_statuses(statuses: &[(u16, &str)]) -> Self {
        let mock = Self::new();
        for (status, body) in statuses {
            mock.push_response(*status, *body);
        }
        mock
    }

    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.script
            .lock()
            .push_back(Ok(UpstreamResponse::new(status, body)));
    }

    pub fn push_error(&self, error: TransportError) {
        self.script.lock().push_back(Err(error));
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>> {
        self.requests.lock().push(request);
        let next = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(UpstreamResponse::new(200, "")));
        Box::pin(async move { next })
    }
}

//! Retrying relay of signed requests.
//!
//! One `relay` call owns its retry state for its whole lifetime. Each attempt
//! is signed with a fresh timestamp. Server errors (>= 500) and network
//! failures are retried on a fixed cooldown; everything below 500 is
//! terminal and returned verbatim.

use std::sync::Arc;
use std::time::Duration;

use relay_core::{Credentials, Order};
use relay_telemetry::Metrics;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::signer::RequestSigner;
use crate::transport::{Transport, UpstreamRequest};

/// Order submission endpoint.
pub const ORDER_PATH: &str = "/api/orders";

/// Synthetic status when every attempt hit a server error.
const STATUS_EXHAUSTED: u16 = 504;
/// Synthetic status when the request could not be built.
const STATUS_FAILED: u16 = 500;
/// Synthetic status when the relay was cancelled.
const STATUS_CANCELLED: u16 = 503;

/// Retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Maximum attempts. Zero is treated as one.
    pub max_retries: u32,
    /// Seconds between attempts. Values below one are raised to one.
    pub cooldown_seconds: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            cooldown_seconds: 1,
        }
    }
}

impl RelayConfig {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds.max(1))
    }
}

/// Relay state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Attempting(u32),
    Succeeded,
    FailedPermanent,
    Exhausted,
    Cancelled,
}

impl RelayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attempting(_) => "attempting",
            Self::Succeeded => "succeeded",
            Self::FailedPermanent => "failed_permanent",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Terminal result of one relay call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub state: RelayState,
    pub status: u16,
    pub body: String,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl RelayOutcome {
    /// Upstream accepted the request with a 2xx.
    pub fn is_success(&self) -> bool {
        self.state == RelayState::Succeeded && (200..300).contains(&self.status)
    }
}

/// Per-call retry bookkeeping.
struct RetryState {
    attempt: u32,
    last_status: Option<u16>,
    last_body: String,
    started: Instant,
}

impl RetryState {
    fn new() -> Self {
        Self {
            attempt: 0,
            last_status: None,
            last_body: String::new(),
            started: Instant::now(),
        }
    }

    fn finish(self, state: RelayState, status: u16, body: String) -> RelayOutcome {
        Metrics::outcome(state.as_str());
        RelayOutcome {
            state,
            status,
            body,
            attempts: self.attempt,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Signs and sends requests, retrying server-side failures.
pub struct RelayExecutor<C: Clock = SystemClock> {
    transport: Arc<dyn Transport>,
    config: RelayConfig,
    clock: C,
}

impl RelayExecutor<SystemClock> {
    pub fn new(transport: Arc<dyn Transport>, config: RelayConfig) -> Self {
        Self::with_clock(transport, config, SystemClock)
    }
}

impl<C: Clock> RelayExecutor<C> {
    pub fn with_clock(transport: Arc<dyn Transport>, config: RelayConfig, clock: C) -> Self {
        Self {
            transport,
            config,
            clock,
        }
    }

    pub fn config(&self) -> RelayConfig {
        self.config
    }

    /// Submit an order to the order endpoint.
    pub async fn submit_order(
        &self,
        credentials: &Credentials,
        order: &Order,
        cancel: &CancellationToken,
    ) -> RelayOutcome {
        let body = match order.to_body() {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Order serialization failed");
                return RetryState::new().finish(RelayState::FailedPermanent, STATUS_FAILED, String::new());
            }
        };

        info!(
            market = %order.market(),
            side = %order.side(),
            order_type = %order.order_type(),
            size = order.size(),
            "Relaying order"
        );
        self.relay(credentials, "POST", ORDER_PATH, &body, cancel)
            .await
    }

    /// Relay one request, retrying until a terminal state.
    pub async fn relay(
        &self,
        credentials: &Credentials,
        method: &str,
        path: &str,
        body: &str,
        cancel: &CancellationToken,
    ) -> RelayOutcome {
        let max_attempts = self.config.max_attempts();
        let signer = RequestSigner::new(credentials);
        let mut retry = RetryState::new();

        loop {
            retry.attempt += 1;
            let state = RelayState::Attempting(retry.attempt);
            debug!(?state, method = %method, path = %path, "Upstream attempt");

            let request = UpstreamRequest {
                method: method.to_string(),
                path: path.to_string(),
                body: body.to_string(),
                headers: signer.sign_request(method, path, body, self.clock.now_ms()),
            };

            let sent_at = Instant::now();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(attempt = retry.attempt, "Relay cancelled in flight");
                    return retry.finish(RelayState::Cancelled, STATUS_CANCELLED, String::new());
                }
                result = self.transport.send(request) => result,
            };

            match result {
                Ok(response) => {
                    let latency_ms = sent_at.elapsed().as_secs_f64() * 1000.0;
                    Metrics::attempt(response.status, method, latency_ms);

                    if response.status < 500 {
                        info!(
                            attempt = retry.attempt,
                            status = response.status,
                            latency_ms,
                            "Upstream responded"
                        );
                        return retry.finish(RelayState::Succeeded, response.status, response.body);
                    }

                    warn!(
                        attempt = retry.attempt,
                        max_attempts,
                        status = response.status,
                        "Upstream server error"
                    );
                    retry.last_status = Some(response.status);
                    retry.last_body = response.body;
                }
                Err(e) if e.is_retryable() => {
                    Metrics::attempt_failed();
                    warn!(attempt = retry.attempt, max_attempts, error = %e, "Upstream unreachable");
                }
                Err(e) => {
                    error!(error = %e, "Upstream request rejected before sending");
                    return retry.finish(RelayState::FailedPermanent, STATUS_FAILED, String::new());
                }
            }

            if retry.attempt >= max_attempts {
                warn!(
                    attempts = retry.attempt,
                    last_status = ?retry.last_status,
                    "Relay retries exhausted"
                );
                let body = std::mem::take(&mut retry.last_body);
                return retry.finish(RelayState::Exhausted, STATUS_EXHAUSTED, body);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(attempt = retry.attempt, "Relay cancelled during cooldown");
                    return retry.finish(RelayState::Cancelled, STATUS_CANCELLED, String::new());
                }
                _ = tokio::time::sleep(self.config.cooldown()) => {}
            }
        }
    }
}

//! Prometheus metrics for the alert relay.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should crash at startup. These panics only occur during static
//! initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    Encoder, HistogramVec, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Inbound alerts by result (relayed/rejected reason).
pub static ALERTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "relay_alerts_total",
        "Total inbound relay requests by result",
        &["result"]
    )
    .unwrap()
});

/// Upstream attempts by status class (2xx/4xx/5xx/network).
pub static ATTEMPTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "relay_attempts_total",
        "Total upstream attempts by status class",
        &["status_class"]
    )
    .unwrap()
});

/// Terminal relay states.
pub static OUTCOMES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "relay_outcomes_total",
        "Terminal relay outcomes by state",
        &["state"]
    )
    .unwrap()
});

/// Per-attempt upstream latency in milliseconds.
pub static UPSTREAM_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "relay_upstream_latency_ms",
        "Upstream request latency in milliseconds",
        &["method"],
        vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Failed pushes to the metrics sink.
pub static SINK_FAILURES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "relay_sink_failures_total",
        "Total failed metrics sink pushes"
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record an inbound request result.
    pub fn alert(result: &str) {
        ALERTS_TOTAL.with_label_values(&[result]).inc();
    }

    /// Record an upstream attempt with its HTTP status.
    pub fn attempt(status: u16, method: &str, latency_ms: f64) {
        ATTEMPTS_TOTAL
            .with_label_values(&[status_class(status)])
            .inc();
        UPSTREAM_LATENCY_MS
            .with_label_values(&[method])
            .observe(latency_ms);
    }

    /// Record an upstream attempt that never got a response.
    pub fn attempt_failed() {
        ATTEMPTS_TOTAL.with_label_values(&["network"]).inc();
    }

    /// Record a terminal relay state.
    pub fn outcome(state: &str) {
        OUTCOMES_TOTAL.with_label_values(&[state]).inc();
    }

    /// Record a failed sink push.
    pub fn sink_failure() {
        SINK_FAILURES_TOTAL.inc();
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

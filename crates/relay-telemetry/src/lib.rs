//! Prometheus metrics, structured logging and metrics sink emission.
//!
//! - Prometheus metrics for alerts, relay attempts and outcomes
//! - Structured JSON logging with tracing
//! - `MetricsEmitter`: pushes per-order gauges to an external sink

pub mod error;
pub mod logging;
pub mod metrics;
pub mod sink;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use sink::{GaugeRecord, MetricsEmitter};

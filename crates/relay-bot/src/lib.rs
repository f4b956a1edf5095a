//! Signed alert relay.
//!
//! Wires the relay crates into one service:
//! - Alert grammar and market resolution (`relay-core`)
//! - Request signing and retrying upstream relay (`relay-executor`)
//! - Logging, Prometheus counters and the metrics sink (`relay-telemetry`)
//! - HTTP ingestion, caller authentication and whitelisting (`relay-server`)

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};

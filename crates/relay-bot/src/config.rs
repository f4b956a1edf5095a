//! Application configuration.

use std::net::SocketAddr;
use std::time::Duration;

use relay_core::{AlertParser, DEFAULT_ALERT_PATTERN};
use relay_executor::RelayConfig;
use relay_server::{ApiWhitelist, AuthConfig, AuthMode, CredentialsConfig, ServerConfig};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Upstream exchange REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Base URL; request paths are appended verbatim.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Broker label attached to emitted metrics.
    #[serde(default = "default_broker")]
    pub broker: String,
    /// Per-attempt request timeout (ms).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://ftx.com".to_string()
}

fn default_broker() -> String {
    "ftx".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            broker: default_broker(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ExchangeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retry settings for upstream calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySection {
    /// Total attempts per relay. 0 behaves as 1.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed pause between attempts. Raised to at least 1s.
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_cooldown_seconds() -> u64 {
    1
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            cooldown_seconds: default_cooldown_seconds(),
        }
    }
}

impl From<&RelaySection> for RelayConfig {
    fn from(section: &RelaySection) -> Self {
        Self {
            max_retries: section.max_retries,
            cooldown_seconds: section.cooldown_seconds,
        }
    }
}

/// Alert grammar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Regex with named groups `ticker`, `side`, `size` and optionally
    /// `price` and `token`.
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_pattern() -> String {
    DEFAULT_ALERT_PATTERN.to_string()
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
        }
    }
}

/// External metrics sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Sink URL; `None` disables emission. Userinfo becomes Basic auth.
    #[serde(default)]
    pub sink_url: Option<String>,
    /// Reporting interval attached to each record.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    10
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            sink_url: None,
            interval_secs: default_interval_secs(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Allowed upstream calls. Requests are refused with 500 while unset.
    #[serde(default)]
    pub api_whitelist: Option<ApiWhitelist>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Reject settings that would fail every request.
    ///
    /// A missing whitelist or missing credentials are left to the request
    /// path, which answers 500.
    pub fn validate(&self) -> AppResult<()> {
        let parser = AlertParser::new(&self.alert.pattern)
            .map_err(|e| AppError::Config(format!("alert.pattern: {e}")))?;

        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("server.listen_addr: {e}")))?;

        if self.exchange.base_url.is_empty() {
            return Err(AppError::Config("exchange.base_url is empty".into()));
        }

        if self.auth.mode == AuthMode::BodyToken {
            if !parser.has_token_group() {
                return Err(AppError::Config(
                    "auth.mode = body_token needs a `token` group in alert.pattern".into(),
                ));
            }
            if self.auth.token.as_deref().map_or(true, str::is_empty) {
                return Err(AppError::Config(
                    "auth.mode = body_token needs auth.token".into(),
                ));
            }
        }

        Ok(())
    }
}

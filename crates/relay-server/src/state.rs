//! Shared handler state.

use std::sync::Arc;

use relay_core::AlertParser;
use relay_executor::RelayExecutor;
use relay_telemetry::MetricsEmitter;
use tokio_util::sync::CancellationToken;

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::whitelist::ApiWhitelist;

/// Collaborators built once at startup and shared read-only by every request.
///
/// `whitelist` and `authenticator` are optional so that a missing one is
/// reported per request (500) rather than hidden.
pub struct RelayServices {
    pub whitelist: Option<Arc<ApiWhitelist>>,
    pub parser: Arc<AlertParser>,
    pub authenticator: Option<Arc<dyn Authenticator>>,
    pub executor: Arc<RelayExecutor>,
    pub emitter: Option<Arc<MetricsEmitter>>,
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    services: Arc<RelayServices>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: ServerConfig, services: RelayServices, shutdown: CancellationToken) -> Self {
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            shutdown,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn services(&self) -> &RelayServices {
        &self.services
    }

    /// Cancelled on process shutdown; aborts in-flight relays.
    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }
}

//! Application wiring and lifecycle.

use std::sync::Arc;

use relay_core::AlertParser;
use relay_executor::{HttpTransport, RelayConfig, RelayExecutor};
use relay_server::{
    build_authenticator, AppState, AuthMode, RelayServices, SecretStore, StaticSecretStore,
};
use relay_telemetry::MetricsEmitter;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Main application.
pub struct Application {
    config: AppConfig,
    shutdown: CancellationToken,
}

impl Application {
    /// Create a new application from validated configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Token that stops the server and aborts in-flight relays when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Build the shared handler state.
    pub fn build_state(&self) -> AppResult<AppState> {
        let config = &self.config;

        let parser = AlertParser::new(&config.alert.pattern)
            .map_err(|e| AppError::Config(format!("alert.pattern: {e}")))?;

        let transport = HttpTransport::new(&config.exchange.base_url, config.exchange.timeout())?;
        let relay = RelayConfig::from(&config.relay);
        info!(
            base_url = %config.exchange.base_url,
            max_attempts = relay.max_attempts(),
            cooldown_ms = relay.cooldown().as_millis() as u64,
            "Upstream configured"
        );
        let executor = RelayExecutor::new(Arc::new(transport), relay);

        let store = self.load_secret_store()?;
        let authenticator = build_authenticator(
            &config.auth,
            config.credentials.to_credentials(),
            store,
        );

        let whitelist = config.api_whitelist.clone().map(Arc::new);
        match &whitelist {
            Some(whitelist) => info!(entries = whitelist.len(), "API whitelist loaded"),
            None => warn!("No API whitelist configured, every relay request will be refused"),
        }

        let emitter = config
            .metrics
            .sink_url
            .as_deref()
            .map(|url| {
                MetricsEmitter::new(url, config.exchange.broker.clone(), config.metrics.interval_secs)
            })
            .filter(MetricsEmitter::is_enabled)
            .map(Arc::new);

        let services = RelayServices {
            whitelist,
            parser: Arc::new(parser),
            authenticator: Some(authenticator),
            executor: Arc::new(executor),
            emitter,
        };

        Ok(AppState::new(
            config.server.clone(),
            services,
            self.shutdown.clone(),
        ))
    }

    fn load_secret_store(&self) -> AppResult<Option<Arc<dyn SecretStore>>> {
        if self.config.auth.mode != AuthMode::Token {
            return Ok(None);
        }

        match &self.config.auth.secrets_file {
            Some(path) => {
                let store = StaticSecretStore::from_file(path)?;
                info!(path = %path, tokens = store.len(), "Secret store loaded");
                let store: Arc<dyn SecretStore> = Arc::new(store);
                Ok(Some(store))
            }
            None => {
                warn!("auth.mode = token without auth.secrets_file, token lookups will fail");
                Ok(None)
            }
        }
    }

    /// Run until ctrl-c, listening on the configured address.
    pub async fn run(self) -> AppResult<()> {
        let state = self.build_state()?;
        self.spawn_signal_handler();

        info!(auth_mode = ?self.config.auth.mode, "Starting application");
        relay_server::run_server(state).await?;
        info!("Application stopped");
        Ok(())
    }

    /// Serve on an already bound listener until the shutdown token is cancelled.
    pub async fn serve(self, listener: TcpListener) -> AppResult<()> {
        let state = self.build_state()?;
        relay_server::serve(listener, state).await?;
        Ok(())
    }

    fn spawn_signal_handler(&self) {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown signal received");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.alert.pattern = "(".into();
        assert!(Application::new(config).is_err());
    }

    #[tokio::test]
    async fn test_build_state_shared_mode() {
        let mut config = AppConfig::default();
        config.auth.mode = AuthMode::Shared;
        config.credentials.api_key = "key".into();
        config.credentials.secret = "secret".into();

        let app = Application::new(config).unwrap();
        let state = app.build_state().unwrap();
        let services = state.services();
        assert!(services.whitelist.is_none());
        assert!(services.emitter.is_none());
        assert_eq!(
            services.authenticator.as_ref().unwrap().mode(),
            AuthMode::Shared
        );
    }

    #[tokio::test]
    async fn test_build_state_loads_secret_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[secrets]\nTOKEN = \"key:secret\"").unwrap();

        let mut config = AppConfig::default();
        config.auth.secrets_file = Some(file.path().to_string_lossy().into_owned());
        let app = Application::new(config).unwrap();
        assert!(app.build_state().is_ok());
    }

    #[tokio::test]
    async fn test_build_state_missing_secret_store_file() {
        let mut config = AppConfig::default();
        config.auth.secrets_file = Some("/nonexistent/secrets.toml".into());
        let app = Application::new(config).unwrap();
        assert!(matches!(app.build_state(), Err(AppError::Server(_))));
    }

    #[tokio::test]
    async fn test_build_state_invalid_sink_url_disables_emitter() {
        let mut config = AppConfig::default();
        config.metrics.sink_url = Some("not a url".into());
        let app = Application::new(config).unwrap();
        assert!(app.build_state().unwrap().services().emitter.is_none());
    }
}

//! relay-server - HTTP surface of the alert relay.
//!
//! # Routes
//!
//! ```text
//! POST /alert            → alert relay (shared / body_token auth)
//! POST /alert/{token}    → alert relay (token auth via secret store)
//! POST /proxy[/{token}]  → signed passthrough of a whitelisted API call
//! GET  /health           → liveness
//! GET  /metrics          → Prometheus text format
//! ```
//!
//! # Request pipeline
//!
//! 1. Caller IP allow-list (401)
//! 2. API whitelist configured (500)
//! 3. Method is POST (405)
//! 4. Authenticator resolves credentials (401 / 500)
//! 5. Body parses into an order (400)
//! 6. Target path/method whitelisted (403)
//! 7. Relay; upstream status and body are passed through, 504 on exhaustion
//!
//! The proxy route parses its JSON body before resolving credentials, since
//! credentials may travel in the body.
//!
//! # Usage
//!
//! ```ignore
//! let state = AppState::new(server_config, services, shutdown.clone());
//! run_server(state).await?;
//! ```

mod auth;
mod config;
mod error;
mod proxy;
mod secrets;
mod server;
mod state;
mod whitelist;

pub use auth::{
    build_authenticator, AuthRequest, Authenticated, Authenticator, BodyTokenAuthenticator,
    SharedCredentialsAuthenticator, TokenLookupAuthenticator,
};
pub use config::{AuthConfig, AuthMode, CredentialsConfig, ServerConfig};
pub use error::{RelayError, ServerError, ServerResult};
pub use proxy::ProxyRequest;
pub use secrets::{SecretStore, StaticSecretStore};
pub use server::{create_router, run_server, serve};
pub use state::{AppState, RelayServices};
pub use whitelist::{ApiWhitelist, WhitelistEntry};

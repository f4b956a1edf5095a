//! Server and caller-authentication configuration.

use relay_core::Credentials;
use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Header carrying the original caller IP when behind a proxy.
    #[serde(default = "default_client_ip_header")]
    pub client_ip_header: String,
    /// Caller IPs allowed to connect. `None` = allow everyone.
    #[serde(default)]
    pub allowed_ips: Option<Vec<String>>,
    /// Maximum accepted request body size.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_client_ip_header() -> String {
    "cf-connecting-ip".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            client_ip_header: default_client_ip_header(),
            allowed_ips: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Whether `ip` may call the relay.
    pub fn is_ip_allowed(&self, ip: Option<&str>) -> bool {
        match &self.allowed_ips {
            None => true,
            Some(allowed) => ip.is_some_and(|ip| allowed.iter().any(|a| a == ip)),
        }
    }
}

/// How callers are authenticated and where credentials come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// One set of credentials from configuration for every caller.
    Shared,
    /// Per-caller credentials looked up by the URL path token.
    #[default]
    Token,
    /// Shared credentials, caller proves itself with a token inside the alert text.
    BodyToken,
}

/// Caller authentication configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    /// Expected in-body alert token (`body_token` mode).
    #[serde(default)]
    pub token: Option<String>,
    /// TOML file mapping path tokens to secret records (`token` mode).
    #[serde(default)]
    pub secrets_file: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("secrets_file", &self.secrets_file)
            .finish()
    }
}

/// Shared exchange credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub sub_account: Option<String>,
}

impl CredentialsConfig {
    /// Credentials, if both key and secret are set.
    pub fn to_credentials(&self) -> Option<Credentials> {
        if self.api_key.is_empty() || self.secret.is_empty() {
            return None;
        }
        Some(Credentials::new(
            self.api_key.clone(),
            self.secret.clone(),
            self.sub_account.clone(),
        ))
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("api_key", &self.api_key)
            .field("secret", &"[REDACTED]")
            .field("sub_account", &self.sub_account)
            .finish()
    }
}

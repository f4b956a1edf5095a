//! Signed passthrough of an arbitrary whitelisted exchange call.

use relay_core::Credentials;
use serde::Deserialize;
use serde_json::Value;

use crate::error::RelayError;

const API_PREFIX: &str = "/api/";
const ALLOWED_METHODS: [&str; 3] = ["GET", "POST", "DELETE"];

/// Proxy request body.
///
/// ```json
/// {"apiKey": "...", "secret": "...", "subAccount": "main",
///  "path": "/api/orders", "method": "POST", "body": {"market": "BTC-PERP"}}
/// ```
#[derive(Deserialize)]
pub struct ProxyRequest {
    #[serde(default, rename = "apiKey")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default, rename = "subAccount")]
    pub sub_account: Option<String>,
    pub path: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// A validated upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProxyCall {
    pub method: &'static str,
    pub path: String,
    pub body: String,
}

impl ProxyRequest {
    /// Credentials carried in the body, if both key and secret are present.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.api_key, &self.secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => Some(
                Credentials::new(key.clone(), secret.clone(), self.sub_account.clone()),
            ),
            _ => None,
        }
    }

    pub(crate) fn validate(&self) -> Result<ProxyCall, RelayError> {
        if !self.path.starts_with(API_PREFIX) {
            return Err(RelayError::Validation(format!(
                "proxy path must start with {API_PREFIX}"
            )));
        }

        let requested = self.method.as_deref().unwrap_or("GET");
        let method = ALLOWED_METHODS
            .into_iter()
            .find(|m| m.eq_ignore_ascii_case(requested))
            .ok_or_else(|| {
                RelayError::Validation(format!("unsupported proxy method: {requested}"))
            })?;

        if method == "POST" && self.body.is_none() {
            return Err(RelayError::Validation("POST requires a body".into()));
        }

        let body = match &self.body {
            Some(value) => serde_json::to_string(value)
                .map_err(|e| RelayError::Validation(format!("unserializable body: {e}")))?,
            None => String::new(),
        };

        Ok(ProxyCall {
            method,
            path: self.path.clone(),
            body,
        })
    }
}

impl std::fmt::Debug for ProxyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyRequest")
            .field("api_key", &self.api_key)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("sub_account", &self.sub_account)
            .field("path", &self.path)
            .field("method", &self.method)
            .finish()
    }
}

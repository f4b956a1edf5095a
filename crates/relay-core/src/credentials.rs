//! Exchange API credentials.
//!
//! The secret is held in a `Zeroizing` buffer so it is wiped on drop, and
//! `Debug` never prints it.

use crate::error::{CoreError, Result};
use zeroize::Zeroizing;

/// API credentials for one relayed request.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret: Zeroizing<String>,
    sub_account: Option<String>,
}

impl Credentials {
    /// Create credentials from explicit values.
    ///
    /// An empty sub-account is treated as none.
    pub fn new(api_key: String, secret: String, sub_account: Option<String>) -> Self {
        Self {
            api_key,
            secret: Zeroizing::new(secret),
            sub_account: sub_account.filter(|s| !s.is_empty()),
        }
    }

    /// Parse a stored secret record of the form `apiKey:secret` or
    /// `apiKey:secret:subAccount`.
    ///
    /// # Errors
    /// Returns `CoreError::MalformedSecret` for any other shape or when the
    /// key or secret is empty.
    pub fn from_record(record: &str) -> Result<Self> {
        let parts: Vec<&str> = record.trim().split(':').collect();
        let (api_key, secret, sub_account) = match parts.as_slice() {
            [key, secret] => (*key, *secret, None),
            [key, secret, sub] => (*key, *secret, Some(*sub)),
            _ => return Err(CoreError::MalformedSecret),
        };

        if api_key.is_empty() || secret.is_empty() {
            return Err(CoreError::MalformedSecret);
        }

        Ok(Self::new(
            api_key.to_string(),
            secret.to_string(),
            sub_account.map(str::to_string),
        ))
    }

    /// The API key (public, safe to log).
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Expose the secret for signing.
    ///
    /// Only use this for the HMAC key. Never log the return value.
    pub fn expose_secret(&self) -> &str {
        self.secret.as_str()
    }

    pub fn sub_account(&self) -> Option<&str> {
        self.sub_account.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"[REDACTED]")
            .field("sub_account", &self.sub_account)
            .finish()
    }
}

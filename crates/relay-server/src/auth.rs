//! Caller authentication strategies.
//!
//! Every strategy turns an inbound request into the exchange credentials to
//! sign with. Selected once at startup from `auth.mode`:
//!
//! - `shared`: configured credentials, no per-caller check
//! - `token`: URL path token looked up in the secret store
//! - `body_token`: configured credentials, alert text must carry the token

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use relay_core::Credentials;
use relay_executor::BoxFuture;
use tracing::debug;

use crate::config::{AuthConfig, AuthMode};
use crate::error::RelayError;
use crate::secrets::SecretStore;

/// Base32 alphabet, 48 to 96 characters.
static PATH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z2-7]{48,96}$").expect("path token pattern is valid"));

/// What the authenticator gets to see of the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthRequest<'a> {
    pub path_token: Option<&'a str>,
}

/// Credentials to relay with, plus the in-body token the alert must carry.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub credentials: Credentials,
    pub expected_token: Option<String>,
}

/// Strategy for resolving a caller to exchange credentials.
pub trait Authenticator: Send + Sync {
    fn mode(&self) -> AuthMode;

    fn authenticate<'a>(
        &'a self,
        request: AuthRequest<'a>,
    ) -> BoxFuture<'a, Result<Authenticated, RelayError>>;
}

/// One set of configured credentials for everyone.
pub struct SharedCredentialsAuthenticator {
    credentials: Option<Credentials>,
}

impl SharedCredentialsAuthenticator {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self { credentials }
    }
}

impl Authenticator for SharedCredentialsAuthenticator {
    fn mode(&self) -> AuthMode {
        AuthMode::Shared
    }

    fn authenticate<'a>(
        &'a self,
        _request: AuthRequest<'a>,
    ) -> BoxFuture<'a, Result<Authenticated, RelayError>> {
        let result = self
            .credentials
            .clone()
            .map(|credentials| Authenticated {
                credentials,
                expected_token: None,
            })
            .ok_or_else(|| RelayError::Configuration("shared credentials not configured".into()));
        Box::pin(async move { result })
    }
}

/// Per-caller credentials from the secret store, keyed by the path token.
pub struct TokenLookupAuthenticator {
    store: Option<Arc<dyn SecretStore>>,
}

impl TokenLookupAuthenticator {
    pub fn new(store: Option<Arc<dyn SecretStore>>) -> Self {
        Self { store }
    }

    async fn lookup(&self, token: Option<&str>) -> Result<Authenticated, RelayError> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| RelayError::Configuration("secret store not configured".into()))?;

        let token = token.ok_or_else(|| RelayError::Authentication("missing token".into()))?;
        if !PATH_TOKEN.is_match(token) {
            return Err(RelayError::Authentication("malformed token".into()));
        }

        let record = store
            .get(token)
            .await
            .ok_or_else(|| RelayError::Authentication("unknown token".into()))?;

        let credentials = Credentials::from_record(&record)
            .map_err(|e| RelayError::Configuration(e.to_string()))?;
        debug!(api_key = %credentials.api_key(), "Token resolved");

        Ok(Authenticated {
            credentials,
            expected_token: None,
        })
    }
}

impl Authenticator for TokenLookupAuthenticator {
    fn mode(&self) -> AuthMode {
        AuthMode::Token
    }

    fn authenticate<'a>(
        &'a self,
        request: AuthRequest<'a>,
    ) -> BoxFuture<'a, Result<Authenticated, RelayError>> {
        Box::pin(self.lookup(request.path_token))
    }
}

/// Configured credentials, gated on a shared token inside the alert text.
pub struct BodyTokenAuthenticator {
    credentials: Option<Credentials>,
    token: Option<String>,
}

impl BodyTokenAuthenticator {
    pub fn new(credentials: Option<Credentials>, token: Option<String>) -> Self {
        Self {
            credentials,
            token: token.filter(|t| !t.is_empty()),
        }
    }
}

impl Authenticator for BodyTokenAuthenticator {
    fn mode(&self) -> AuthMode {
        AuthMode::BodyToken
    }

    fn authenticate<'a>(
        &'a self,
        _request: AuthRequest<'a>,
    ) -> BoxFuture<'a, Result<Authenticated, RelayError>> {
        let result = match (&self.credentials, &self.token) {
            (None, _) => Err(RelayError::Configuration("shared credentials not configured".into())),
            (_, None) => Err(RelayError::Configuration("alert token not configured".into())),
            (Some(credentials), Some(token)) => Ok(Authenticated {
                credentials: credentials.clone(),
                expected_token: Some(token.clone()),
            }),
        };
        Box::pin(async move { result })
    }
}

/// Build the authenticator selected by `config.mode`.
pub fn build_authenticator(
    config: &AuthConfig,
    credentials: Option<Credentials>,
    store: Option<Arc<dyn SecretStore>>,
) -> Arc<dyn Authenticator> {
    match config.mode {
        AuthMode::Shared => Arc::new(SharedCredentialsAuthenticator::new(credentials)),
        AuthMode::Token => Arc::new(TokenLookupAuthenticator::new(store)),
        AuthMode::BodyToken => Arc::new(BodyTokenAuthenticator::new(
            credentials,
            config.token.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::StaticSecretStore;
    use std::collections::HashMap;

    const TOKEN: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

    fn creds() -> Credentials {
        Credentials::new("key".into(), "secret".into(), None)
    }

    fn store(record: &str) -> Arc<dyn SecretStore> {
        Arc::new(StaticSecretStore::new(HashMap::from([(
            TOKEN.to_string(),
            record.to_string(),
        )])))
    }

    fn with_token(token: &str) -> AuthRequest<'_> {
        AuthRequest {
            path_token: Some(token),
        }
    }

    #[tokio::test]
    async fn test_shared_returns_configured_credentials() {
        let auth = SharedCredentialsAuthenticator::new(Some(creds()));
        let result = auth.authenticate(AuthRequest::default()).await.unwrap();
        assert_eq!(result.credentials.api_key(), "key");
        assert!(result.expected_token.is_none());
    }

    #[tokio::test]
    async fn test_shared_without_credentials_is_configuration_error() {
        let auth = SharedCredentialsAuthenticator::new(None);
        let result = auth.authenticate(AuthRequest::default()).await;
        assert!(matches!(result, Err(RelayError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_token_lookup_resolves_record() {
        let auth = TokenLookupAuthenticator::new(Some(store("k1:s1:sub")));
        let result = auth.authenticate(with_token(TOKEN)).await.unwrap();
        assert_eq!(result.credentials.api_key(), "k1");
        assert_eq!(result.credentials.sub_account(), Some("sub"));
    }

    #[tokio::test]
    async fn test_token_lookup_missing_token() {
        let auth = TokenLookupAuthenticator::new(Some(store("k1:s1")));
        let result = auth.authenticate(AuthRequest::default()).await;
        assert!(matches!(result, Err(RelayError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_token_lookup_malformed_token() {
        let auth = TokenLookupAuthenticator::new(Some(store("k1:s1")));
        // too short
        assert!(matches!(
            auth.authenticate(with_token("JBSWY3DP")).await,
            Err(RelayError::Authentication(_))
        ));
        // lowercase is outside the alphabet
        let lower = TOKEN.to_lowercase();
        assert!(matches!(
            auth.authenticate(with_token(&lower)).await,
            Err(RelayError::Authentication(_))
        ));
        // 1, 8, 9 are not base32
        let digits = "1".repeat(48);
        assert!(matches!(
            auth.authenticate(with_token(&digits)).await,
            Err(RelayError::Authentication(_))
        ));
        // too long
        let long = "A".repeat(97);
        assert!(matches!(
            auth.authenticate(with_token(&long)).await,
            Err(RelayError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_token_lookup_unknown_token() {
        let auth = TokenLookupAuthenticator::new(Some(store("k1:s1")));
        let other = "A".repeat(64);
        assert!(matches!(
            auth.authenticate(with_token(&other)).await,
            Err(RelayError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_token_lookup_without_store() {
        let auth = TokenLookupAuthenticator::new(None);
        assert!(matches!(
            auth.authenticate(with_token(TOKEN)).await,
            Err(RelayError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_token_lookup_malformed_record() {
        let auth = TokenLookupAuthenticator::new(Some(store("no-colon-here")));
        assert!(matches!(
            auth.authenticate(with_token(TOKEN)).await,
            Err(RelayError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_body_token_passes_expected_token() {
        let auth = BodyTokenAuthenticator::new(Some(creds()), Some("s3cret".into()));
        let result = auth.authenticate(AuthRequest::default()).await.unwrap();
        assert_eq!(result.expected_token.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn test_body_token_requires_token_and_credentials() {
        let no_token = BodyTokenAuthenticator::new(Some(creds()), Some(String::new()));
        assert!(matches!(
            no_token.authenticate(AuthRequest::default()).await,
            Err(RelayError::Configuration(_))
        ));

        let no_creds = BodyTokenAuthenticator::new(None, Some("s3cret".into()));
        assert!(matches!(
            no_creds.authenticate(AuthRequest::default()).await,
            Err(RelayError::Configuration(_))
        ));
    }

    #[test]
    fn test_build_authenticator_selects_mode() {
        for mode in [AuthMode::Shared, AuthMode::Token, AuthMode::BodyToken] {
            let config = AuthConfig {
                mode,
                ..Default::default()
            };
            assert_eq!(build_authenticator(&config, None, None).mode(), mode);
        }
    }
}

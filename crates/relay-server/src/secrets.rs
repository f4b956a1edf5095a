//! Token to secret record lookup.
//!
//! Records are `apiKey:secret` or `apiKey:secret:subAccount` strings keyed by
//! an opaque caller token. The store is read-only after construction.

use std::collections::HashMap;
use std::path::Path;

use relay_executor::BoxFuture;
use serde::Deserialize;

use crate::error::{ServerError, ServerResult};

/// Read-only secret record lookup.
pub trait SecretStore: Send + Sync {
    /// The raw record for `token`, if any.
    fn get<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Option<String>>;
}

/// In-memory store, typically loaded from a TOML file.
#[derive(Default)]
pub struct StaticSecretStore {
    records: HashMap<String, String>,
}

#[derive(Deserialize)]
struct SecretsFile {
    #[serde(default)]
    secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new(records: HashMap<String, String>) -> Self {
        Self { records }
    }

    /// Load a file of the form:
    ///
    /// ```toml
    /// [secrets]
    /// "TOKEN..." = "apiKey:secret:subAccount"
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ServerError::SecretStore(format!("Failed to read secrets: {e}")))?;
        let file: SecretsFile = toml::from_str(&content)
            .map_err(|e| ServerError::SecretStore(format!("Failed to parse secrets: {e}")))?;
        Ok(Self::new(file.secrets))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SecretStore for StaticSecretStore {
    fn get<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Option<String>> {
        let record = self.records.get(token).cloned();
        Box::pin(async move { record })
    }
}

impl std::fmt::Debug for StaticSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSecretStore")
            .field("records", &self.records.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_lookup() {
        let store = StaticSecretStore::new(HashMap::from([(
            "TOKEN".to_string(),
            "key:secret".to_string(),
        )]));
        assert_eq!(store.get("TOKEN").await.as_deref(), Some("key:secret"));
        assert_eq!(store.get("OTHER").await, None);
    }

    #[tokio::test]
    async fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[secrets]\nABC = \"key:secret:sub\"").unwrap();

        let store = StaticSecretStore::from_file(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("ABC").await.as_deref(), Some("key:secret:sub"));
    }

    #[test]
    fn test_from_file_missing() {
        assert!(StaticSecretStore::from_file("/nonexistent/secrets.toml").is_err());
    }

    #[test]
    fn test_debug_hides_records() {
        let store = StaticSecretStore::new(HashMap::from([(
            "TOKEN".to_string(),
            "key:hunter2".to_string(),
        )]));
        assert!(!format!("{store:?}").contains("hunter2"));
    }
}

//! Upstream API path/method whitelist.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Allowed methods for one API path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub methods: Vec<String>,
}

/// Exchange API calls the relay may make, keyed by exact path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiWhitelist {
    entries: HashMap<String, WhitelistEntry>,
}

impl ApiWhitelist {
    pub fn new(entries: HashMap<String, WhitelistEntry>) -> Self {
        Self { entries }
    }

    /// Whether `method` on `path` is allowed. Methods compare case-insensitively.
    pub fn allows(&self, path: &str, method: &str) -> bool {
        self.entries
            .get(path)
            .is_some_and(|entry| entry.methods.iter().any(|m| m.eq_ignore_ascii_case(method)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist() -> ApiWhitelist {
        toml::from_str(
            r#"
            "/api/orders" = { methods = ["POST", "GET"] }
            "/api/positions" = { methods = ["GET"] }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_allows_listed_path_and_method() {
        let whitelist = whitelist();
        assert_eq!(whitelist.len(), 2);
        assert!(whitelist.allows("/api/orders", "POST"));
        assert!(whitelist.allows("/api/orders", "post"));
        assert!(whitelist.allows("/api/positions", "GET"));
    }

    #[test]
    fn test_rejects_unlisted() {
        let whitelist = whitelist();
        assert!(!whitelist.allows("/api/positions", "POST"));
        assert!(!whitelist.allows("/api/orders", "DELETE"));
        assert!(!whitelist.allows("/api/wallet/withdrawals", "POST"));
        assert!(!whitelist.allows("/api/orders/", "POST"));
    }
}

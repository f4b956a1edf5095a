//! HMAC-SHA256 request signing for the exchange REST API.
//!
//! The signed string is `timestamp ‖ method ‖ path ‖ body` with no
//! separators. The hex digest travels in `ftx-sign` next to the timestamp
//! (`ftx-ts`) and the key (`ftx-key`).
//!
//! Never log the signed string, the signature or the secret.

use hmac::{Hmac, Mac};
use relay_core::Credentials;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_KEY: &str = "ftx-key";
pub const HEADER_TIMESTAMP: &str = "ftx-ts";
pub const HEADER_SIGNATURE: &str = "ftx-sign";
pub const HEADER_SUBACCOUNT: &str = "ftx-subaccount";

const CONTENT_TYPE_JSON: &str = "application/json";

/// Authentication headers for one attempt.
///
/// Built fresh per attempt because the timestamp is part of the signature.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    api_key: String,
    timestamp: String,
    signature: String,
    sub_account: Option<String>,
}

impl SignedHeaders {
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn sub_account(&self) -> Option<&str> {
        self.sub_account.as_deref()
    }

    /// All headers as name/value pairs, content-type first.
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            (HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON),
            (HEADER_KEY, self.api_key.as_str()),
            (HEADER_TIMESTAMP, self.timestamp.as_str()),
            (HEADER_SIGNATURE, self.signature.as_str()),
        ];
        if let Some(sub_account) = &self.sub_account {
            pairs.push((HEADER_SUBACCOUNT, sub_account.as_str()));
        }
        pairs
    }
}

impl std::fmt::Debug for SignedHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedHeaders")
            .field("api_key", &self.api_key)
            .field("timestamp", &self.timestamp)
            .field("signature", &"[REDACTED]")
            .field("sub_account", &self.sub_account)
            .finish()
    }
}

/// Request signer for authenticated exchange calls.
pub struct RequestSigner<'a> {
    credentials: &'a Credentials,
}

impl<'a> RequestSigner<'a> {
    pub fn new(credentials: &'a Credentials) -> Self {
        Self { credentials }
    }

    /// HMAC-SHA256 of `message` keyed by the secret, as lowercase hex.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.credentials.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");

        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Build the header set for one request.
    ///
    /// `body` is the exact string that will be sent (empty for no body).
    pub fn sign_request(
        &self,
        method: &str,
        path: &str,
        body: &str,
        timestamp_ms: u64,
    ) -> SignedHeaders {
        let timestamp = timestamp_ms.to_string();
        let signable = format!("{timestamp}{method}{path}{body}");

        SignedHeaders {
            api_key: self.credentials.api_key().to_string(),
            signature: self.sign(&signable),
            timestamp,
            sub_account: self.credentials.sub_account().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "T4lPid48QtjNxjLUFOcUZghD7CUJ7sTVsfuvQZF2";

    fn creds(sub_account: Option<&str>) -> Credentials {
        Credentials::new(
            "LR0RQT6bKjrUNh38eCw9jYC89VDAbRkCogAc_XAm".into(),
            SECRET.into(),
            sub_account.map(str::to_string),
        )
    }

    #[test]
    fn test_sign_known_vector_get() {
        // Exchange API documentation example
        let creds = creds(None);
        let headers = RequestSigner::new(&creds).sign_request("GET", "/api/markets", "", 1588591511721);

        assert_eq!(headers.timestamp(), "1588591511721");
        assert_eq!(
            headers.signature(),
            "dbc62ec300b2624c580611858d94f2332ac636bb86eccfa1167a7777c496ee6f"
        );
    }

    #[test]
    fn test_sign_known_vector_post() {
        let creds = creds(None);
        let body = r#"{"market": "BTC-PERP", "side": "buy", "price": 8500, "size": 1, "type": "limit", "reduceOnly": false, "ioc": false, "postOnly": false, "clientId": null}"#;
        let headers = RequestSigner::new(&creds).sign_request("POST", "/api/orders", body, 1588591856950);

        assert_eq!(
            headers.signature(),
            "c4fbabaf178658a59d7bbf57678d44c369382f3da29138f04cd46d3d582ba4ba"
        );
    }

    #[test]
    fn test_signature_is_concatenation() {
        let creds = creds(None);
        let signer = RequestSigner::new(&creds);
        let headers = signer.sign_request("POST", "/api/orders", "{}", 1000);
        assert_eq!(headers.signature(), signer.sign("1000POST/api/orders{}"));
    }

    #[test]
    fn test_any_input_change_changes_signature() {
        let creds = creds(None);
        let signer = RequestSigner::new(&creds);
        let base = signer.sign_request("POST", "/api/orders", "{}", 1000);

        assert_ne!(base, signer.sign_request("GET", "/api/orders", "{}", 1000));
        assert_ne!(base, signer.sign_request("POST", "/api/order", "{}", 1000));
        assert_ne!(base, signer.sign_request("POST", "/api/orders", "{ }", 1000));
        assert_ne!(base, signer.sign_request("POST", "/api/orders", "{}", 1001));

        let other = Credentials::new(creds.api_key().into(), "other".into(), None);
        let other_sig = RequestSigner::new(&other).sign_request("POST", "/api/orders", "{}", 1000);
        assert_ne!(base.signature(), other_sig.signature());
    }

    #[test]
    fn test_deterministic() {
        let creds = creds(None);
        let signer = RequestSigner::new(&creds);
        assert_eq!(
            signer.sign_request("GET", "/api/account", "", 7),
            signer.sign_request("GET", "/api/account", "", 7)
        );
    }

    #[test]
    fn test_header_pairs_without_sub_account() {
        let creds = creds(None);
        let headers = RequestSigner::new(&creds).sign_request("GET", "/api/account", "", 5);
        let pairs = headers.to_pairs();

        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[0], ("content-type", "application/json"));
        assert_eq!(pairs[1].0, HEADER_KEY);
        assert_eq!(pairs[2], (HEADER_TIMESTAMP, "5"));
        assert!(pairs.iter().all(|(name, _)| *name != HEADER_SUBACCOUNT));
    }

    #[test]
    fn test_header_pairs_with_sub_account() {
        let creds = creds(Some("swing"));
        let headers = RequestSigner::new(&creds).sign_request("GET", "/api/account", "", 5);
        assert!(headers.to_pairs().contains(&(HEADER_SUBACCOUNT, "swing")));
    }

    #[test]
    fn test_empty_sub_account_omitted() {
        let creds = creds(Some(""));
        let headers = RequestSigner::new(&creds).sign_request("GET", "/api/account", "", 5);
        assert_eq!(headers.sub_account(), None);
    }

    #[test]
    fn test_debug_redacts_signature() {
        let creds = creds(None);
        let headers = RequestSigner::new(&creds).sign_request("GET", "/api/markets", "", 1588591511721);
        let debug_str = format!("{headers:?}");
        assert!(!debug_str.contains(headers.signature()));
        assert!(!debug_str.contains(SECRET));
    }
}

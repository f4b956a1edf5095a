//! Ticker token to exchange market identifier.
//!
//! The exchange names spot markets `BASE/USD` and everything else
//! (perpetuals, dated futures) `BASE-SUFFIX`. Alert sources render the same
//! instruments as a single glued token such as `BTCUSD`, `BTCPERP` or
//! `BTC0326`, so the suffix is split off and the separator chosen from it.
//! Hyphens are dropped first, so the exchange's own `BTC-PERP` spelling
//! resolves to itself.

use once_cell::sync::Lazy;
use regex::Regex;

/// Quote segment followed by `PERP`, `USD` or a date of at least four digits.
static TICKER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([A-Z0-9]+?)(PERP|USD|\d{4,})$").expect("ticker pattern is valid")
});

/// Resolve a ticker token to a market identifier.
///
/// Returns `None` when the token does not look like a known market shape.
pub fn resolve_market(ticker: &str) -> Option<String> {
    let token = ticker.trim().replace('-', "");
    let caps = TICKER_PATTERN.captures(&token)?;
    let base = caps.get(1)?.as_str().to_uppercase();
    let suffix = caps.get(2)?.as_str().to_uppercase();

    if suffix == "USD" {
        Some(format!("{base}/{suffix}"))
    } else {
        Some(format!("{base}-{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_market_uses_slash() {
        assert_eq!(resolve_market("BTCUSD").as_deref(), Some("BTC/USD"));
        assert_eq!(resolve_market("ethusd").as_deref(), Some("ETH/USD"));
    }

    #[test]
    fn test_perp_market_uses_hyphen() {
        assert_eq!(resolve_market("BTCPERP").as_deref(), Some("BTC-PERP"));
        assert_eq!(resolve_market("btcperp").as_deref(), Some("BTC-PERP"));
        assert_eq!(resolve_market("SolPerp").as_deref(), Some("SOL-PERP"));
    }

    #[test]
    fn test_dated_future_uses_hyphen() {
        assert_eq!(resolve_market("BTC0326").as_deref(), Some("BTC-0326"));
        assert_eq!(resolve_market("ETH20241227").as_deref(), Some("ETH-20241227"));
    }

    #[test]
    fn test_short_digit_suffix_rejected() {
        assert_eq!(resolve_market("BTC326"), None);
    }

    #[test]
    fn test_usd_suffix_only_exact() {
        // USDT is not USD: no PERP/USD/date suffix, so no market.
        assert_eq!(resolve_market("BTCUSDT"), None);
    }

    #[test]
    fn test_unrecognized_tokens() {
        assert_eq!(resolve_market("???"), None);
        assert_eq!(resolve_market(""), None);
        assert_eq!(resolve_market("PERP"), None);
        assert_eq!(resolve_market("-PERP"), None);
    }

    #[test]
    fn test_hyphenated_token_resolves_to_itself() {
        assert_eq!(resolve_market("BTC-PERP").as_deref(), Some("BTC-PERP"));
        assert_eq!(resolve_market("btc-perp").as_deref(), Some("BTC-PERP"));
        assert_eq!(resolve_market("BTC-0326").as_deref(), Some("BTC-0326"));
        assert_eq!(resolve_market("ETH-USD").as_deref(), Some("ETH/USD"));
    }

    #[test]
    fn test_deterministic() {
        for _ in 0..3 {
            assert_eq!(resolve_market("AVAXPERP").as_deref(), Some("AVAX-PERP"));
        }
    }
}

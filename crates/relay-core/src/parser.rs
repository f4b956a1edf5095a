//! Alert text to `Order`.
//!
//! The alert grammar is an operator-supplied regular expression with named
//! groups:
//! - `ticker`, `side`, `size` (required)
//! - `price` (optional, its presence makes the order a limit order)
//! - `token` (optional, shared secret carried in the alert body)
//!
//! Parsing is all-or-nothing: every failure yields `None`, never a partial
//! order and never an error to the caller.

use crate::error::{CoreError, Result};
use crate::market::resolve_market;
use crate::order::{Order, OrderSide};
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Matches the default TradingView strategy alert message:
/// `{{strategy.order.action}} @ {{strategy.order.contracts}} filled on {{ticker}}`.
pub const DEFAULT_ALERT_PATTERN: &str =
    r"(?P<side>buy|sell) @ (?P<size>[0-9.]+) filled on (?P<ticker>[A-Za-z0-9-]+)";

const REQUIRED_GROUPS: [&str; 3] = ["ticker", "side", "size"];

/// Compiled alert grammar.
#[derive(Debug, Clone)]
pub struct AlertParser {
    regex: Regex,
    has_token: bool,
}

impl AlertParser {
    /// Compile an alert pattern in multi-line, dot-matches-newline mode.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidPattern` if the pattern does not compile and
    /// `CoreError::MissingGroup` if a required named group is absent.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .multi_line(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| CoreError::InvalidPattern(e.to_string()))?;

        let has_group = |name: &str| regex.capture_names().flatten().any(|n| n == name);

        for group in REQUIRED_GROUPS {
            if !has_group(group) {
                return Err(CoreError::MissingGroup(group));
            }
        }
        let has_token = has_group("token");

        Ok(Self { regex, has_token })
    }

    /// Whether the grammar captures an in-body `token`.
    pub fn has_token_group(&self) -> bool {
        self.has_token
    }

    /// Parse an alert into an order.
    ///
    /// When the grammar has a `token` group and `expected_token` is given,
    /// the captured token must equal it exactly.
    pub fn parse(&self, text: &str, expected_token: Option<&str>) -> Option<Order> {
        let Some(caps) = self.regex.captures(text) else {
            debug!("Alert did not match pattern");
            return None;
        };

        if self.has_token {
            if let Some(expected) = expected_token {
                let captured = caps.name("token").map_or("", |m| m.as_str());
                if captured != expected {
                    debug!("Alert token mismatch");
                    return None;
                }
            }
        }

        let ticker = caps.name("ticker")?.as_str();
        let Some(market) = resolve_market(ticker) else {
            debug!(ticker = %ticker, "Unrecognized ticker");
            return None;
        };

        let size: f64 = caps.name("size")?.as_str().trim().parse().ok()?;

        let price = match caps
            .name("price")
            .map(|m| m.as_str().trim())
            .filter(|raw| !raw.is_empty())
        {
            Some(raw) => {
                let price: f64 = raw.parse().ok()?;
                if !price.is_finite() {
                    return None;
                }
                Some(price)
            }
            None => None,
        };

        let side = OrderSide::from_alert(caps.name("side").map_or("", |m| m.as_str()));

        match Order::new(market, side, size, price) {
            Ok(order) => Some(order),
            Err(e) => {
                debug!(error = %e, "Alert produced an invalid order");
                None
            }
        }
    }
}

/// One-shot parse with an uncompiled pattern.
///
/// A malformed pattern or missing group is a parse failure like any other.
pub fn parse_order(pattern: &str, text: &str, expected_token: Option<&str>) -> Option<Order> {
    AlertParser::new(pattern)
        .ok()?
        .parse(text, expected_token)
}

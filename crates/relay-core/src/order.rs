//! Order-related types.
//!
//! An `Order` is the structured form of an alert, ready to be signed and
//! submitted. It serializes directly into the exchange's order body.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Map a captured alert word to a side.
    ///
    /// Only the exact lowercase literal `buy` is a buy. Anything else,
    /// including `BUY` and the empty string, falls back to sell.
    pub fn from_alert(captured: &str) -> Self {
        if captured == "buy" {
            Self::Buy
        } else {
            Self::Sell
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Market order (no price).
    Market,
    /// Limit order.
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "market"),
            Self::Limit => write!(f, "limit"),
        }
    }
}

/// A validated trade order.
///
/// Field order matters: it is the field order of the JSON body sent to the
/// exchange, and that body is part of the signed string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    market: String,
    side: OrderSide,
    price: Option<f64>,
    #[serde(rename = "type")]
    order_type: OrderType,
    size: f64,
}

impl Order {
    /// Build an order. The type is derived from the presence of `price`.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidSize` unless `size` is finite and positive.
    pub fn new(
        market: impl Into<String>,
        side: OrderSide,
        size: f64,
        price: Option<f64>,
    ) -> Result<Self> {
        if !size.is_finite() || size <= 0.0 {
            return Err(CoreError::InvalidSize(size.to_string()));
        }

        let order_type = if price.is_some() {
            OrderType::Limit
        } else {
            OrderType::Market
        };

        Ok(Self {
            market: market.into(),
            side,
            price,
            order_type,
            size,
        })
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    /// Render the exchange request body.
    pub fn to_body(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

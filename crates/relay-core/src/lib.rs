//! Core domain types for the alert relay.
//!
//! This crate provides the pieces every other crate builds on:
//! - `Order`, `OrderSide`, `OrderType`: the validated trade request
//! - `resolve_market`: ticker token to exchange market identifier
//! - `AlertParser`: free-text alert to `Order`
//! - `Credentials`: exchange API credentials with a redacted secret

pub mod credentials;
pub mod error;
pub mod market;
pub mod order;
pub mod parser;

pub use credentials::Credentials;
pub use error::{CoreError, Result};
pub use market::resolve_market;
pub use order::{Order, OrderSide, OrderType};
pub use parser::{parse_order, AlertParser, DEFAULT_ALERT_PATTERN};

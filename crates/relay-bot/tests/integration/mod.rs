//! Integration tests for relay-bot.
//!
//! These tests run the full relay against a mock exchange:
//! - Alert to signed order
//! - Retry and exhaustion behavior
//! - Caller authentication modes
//! - Metrics sink emission

pub mod common;

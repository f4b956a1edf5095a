//! Signed order relay to the upstream exchange.
//!
//! # Key Components
//!
//! - [`RequestSigner`]: HMAC-SHA256 authentication headers per request
//! - [`Transport`]: seam for the outbound HTTP call ([`HttpTransport`], [`MockTransport`])
//! - [`RelayExecutor`]: fixed-cooldown retry state machine
//!
//! # Relay states
//!
//! 1. `Attempting(n)`: sign with a fresh timestamp, send, drain the body
//! 2. status < 500 -> `Succeeded` (4xx included, passed through verbatim)
//! 3. status >= 500 and n < max -> sleep cooldown, `Attempting(n + 1)`
//! 4. status >= 500 and n == max -> `Exhausted` (synthetic 504)

pub mod clock;
pub mod error;
pub mod executor;
pub mod signer;
pub mod transport;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ExecutorError, ExecutorResult, TransportError};
pub use executor::{RelayConfig, RelayExecutor, RelayOutcome, RelayState, ORDER_PATH};
pub use signer::{RequestSigner, SignedHeaders};
pub use transport::{
    BoxFuture, HttpTransport, MockTransport, Transport, UpstreamRequest, UpstreamResponse,
};

//! Retry policy for upstream requests.
//!
//! Error classification (timeouts, throttling, connection failures) and the
//! fixed-delay retry loop shared by the cached fetcher and artwork downloads.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::TransportError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryExhausted};

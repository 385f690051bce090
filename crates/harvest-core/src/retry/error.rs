//! Transport error type for retry classification.

use std::fmt;

/// Error returned by a single request attempt (curl failure, HTTP status, empty body or local IO).
/// Classified by the retry loop before being surfaced as a `FetchError`.
#[derive(Debug)]
pub enum TransportError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// Response completed with a non-2xx status.
    Http(u32),
    /// Response completed with a 2xx status but carried no body.
    EmptyBody,
    /// Local file write failed while streaming a download. Not retried.
    Io(std::io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Curl(e) => write!(f, "{}", e),
            TransportError::Http(code) => write!(f, "HTTP {}", code),
            TransportError::EmptyBody => write!(f, "empty response body"),
            TransportError::Io(e) => write!(f, "io: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Curl(e) => Some(e),
            TransportError::Io(e) => Some(e),
            TransportError::Http(_) | TransportError::EmptyBody => None,
        }
    }
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        TransportError::Curl(e)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

//! Errors surfaced by the cached fetcher.

use std::path::PathBuf;

use crate::retry::{RetryExhausted, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure after exhausting retries.
    #[error("network error fetching {url} after {attempts} attempt(s): {source}")]
    Network {
        url: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },
    /// Response completed with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u32 },
    /// 2xx response with an empty body. Never cached.
    #[error("empty response from {url}")]
    EmptyResponse { url: String },
    /// Body was not the expected JSON. The cache entry has been purged.
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        /// The bad body was replayed from the cache rather than downloaded.
        from_cache: bool,
        #[source]
        source: serde_json::Error,
    },
    /// Local cache storage failed.
    #[error("response cache error at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        /// The body had already been downloaded when the cache failed.
        fetched: bool,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Whether the failed call made a request to the upstream server.
    pub fn reached_network(&self) -> bool {
        match self {
            FetchError::Network { .. }
            | FetchError::Http { .. }
            | FetchError::EmptyResponse { .. } => true,
            FetchError::Decode { from_cache, .. } => !from_cache,
            FetchError::Cache { fetched, .. } => *fetched,
        }
    }

    pub(crate) fn from_exhausted(url: &str, e: RetryExhausted) -> Self {
        match e.error {
            TransportError::EmptyBody => FetchError::EmptyResponse {
                url: url.to_string(),
            },
            TransportError::Http(status) => FetchError::Http {
                url: url.to_string(),
                status,
            },
            error => FetchError::Network {
                url: url.to_string(),
                attempts: e.attempts,
                source: error,
            },
        }
    }
}

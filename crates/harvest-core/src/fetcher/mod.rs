//! Cached, retrying fetch layer.
//!
//! `fetch` serves a URL from the response cache when a non-empty entry
//! exists and otherwise GETs it through the `HttpClient` under the retry
//! policy, caching a non-empty body before returning it. `fetch_json` adds
//! decoding and purges the entry when the body does not decode, so a bad
//! body is never replayed on a later run.

mod error;

pub use error::FetchError;

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::http::{download_to_file, HttpClient};
use crate::retry::{run_with_retry, RetryPolicy, TransportError};

/// A fetched value and whether it came from the local cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub from_cache: bool,
}

#[derive(Clone)]
pub struct Fetcher {
    cache: ResponseCache,
    client: Arc<dyn HttpClient>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(cache: ResponseCache, client: Arc<dyn HttpClient>, policy: RetryPolicy) -> Self {
        Self {
            cache,
            client,
            policy,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// GET `url` as text, consulting the cache first.
    pub async fn fetch(&self, url: &str) -> Result<Fetched<String>, FetchError> {
        let cached = self
            .cache
            .lookup(url)
            .await
            .map_err(|source| self.cache_error(url, false, source))?;
        if let Some(bytes) = cached {
            tracing::debug!(url, "cache hit");
            return Ok(Fetched {
                value: String::from_utf8_lossy(&bytes).into_owned(),
                from_cache: true,
            });
        }

        tracing::debug!(url, "cache miss");
        let body = run_with_retry(&self.policy, url, || self.get_once(url))
            .await
            .map_err(|e| FetchError::from_exhausted(url, e))?;

        self.cache
            .store(url, &body)
            .await
            .map_err(|source| self.cache_error(url, true, source))?;

        Ok(Fetched {
            value: String::from_utf8_lossy(&body).into_owned(),
            from_cache: false,
        })
    }

    /// GET `url` and decode it as JSON. A body that does not decode is purged
    /// from the cache and surfaced as `FetchError::Decode` without retrying.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Fetched<T>, FetchError> {
        let fetched = self.fetch(url).await?;
        match serde_json::from_str::<T>(&fetched.value) {
            Ok(value) => Ok(Fetched {
                value,
                from_cache: fetched.from_cache,
            }),
            Err(source) => {
                tracing::warn!(url, error = %source, "purging undecodable cache entry");
                self.cache
                    .purge(url)
                    .await
                    .map_err(|e| self.cache_error(url, !fetched.from_cache, e))?;
                Err(FetchError::Decode {
                    url: url.to_string(),
                    from_cache: fetched.from_cache,
                    source,
                })
            }
        }
    }

    /// Download a binary asset straight to `dest` (not cached; the file itself
    /// is the record). Returns the number of bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        run_with_retry(&self.policy, url, || self.download_once(url, dest.to_path_buf()))
            .await
            .map_err(|e| FetchError::from_exhausted(url, e))
    }

    async fn get_once(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let client = Arc::clone(&self.client);
        let url = url.to_string();
        let body = tokio::task::spawn_blocking(move || client.get(&url))
            .await
            .map_err(join_error)??;
        if body.is_empty() {
            return Err(TransportError::EmptyBody);
        }
        Ok(body)
    }

    async fn download_once(&self, url: &str, dest: PathBuf) -> Result<u64, TransportError> {
        let client = Arc::clone(&self.client);
        let url = url.to_string();
        tokio::task::spawn_blocking(move || download_to_file(client.as_ref(), &url, &dest))
            .await
            .map_err(join_error)?
    }

    fn cache_error(&self, url: &str, fetched: bool, source: std::io::Error) -> FetchError {
        FetchError::Cache {
            path: self.cache.path_for(url),
            fetched,
            source,
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> TransportError {
    TransportError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("transfer task join: {}", e),
    ))
}

//! HTTP GET transport.
//!
//! `HttpClient` is the seam between the crawl engine and the network: the
//! cached fetcher and the asset acquirer only talk to this trait, and
//! `CurlClient` implements it with libcurl. Calls are blocking; async callers
//! go through `tokio::task::spawn_blocking`.

mod curl_client;
mod file;

#[cfg(test)]
pub(crate) mod fake;

pub use curl_client::CurlClient;
pub use file::{download_to_file, PART_SUFFIX};

use crate::retry::TransportError;
use std::io::Write;

/// Header set sent with every request. The catalog sources reject clients
/// that do not look like a browser.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    ),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.9,image/avif,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Blocking HTTP GET client.
pub trait HttpClient: Send + Sync {
    /// GET `url` and return the body of a 2xx response. Non-2xx statuses are
    /// `TransportError::Http`. An empty 2xx body is returned as-is.
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;

    /// GET `url` and stream the body of a 2xx response into `out`.
    /// Returns the number of bytes written.
    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64, TransportError>;
}

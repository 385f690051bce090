//! libcurl-backed `HttpClient`.

use std::io::Write;
use std::time::Duration;

use super::{HttpClient, BROWSER_HEADERS};
use crate::retry::TransportError;

/// Curl timeouts. The total timeout bounds every request so a stalled
/// upstream cannot hang a batch.
#[derive(Debug, Clone, Copy)]
pub struct CurlClient {
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for CurlClient {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(30),
        }
    }
}

impl CurlClient {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }

    fn easy(&self, url: &str) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.accept_encoding("")?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        let mut list = curl::easy::List::new();
        for (k, v) in BROWSER_HEADERS {
            list.append(&format!("{}: {}", k, v))?;
        }
        easy.http_headers(list)?;
        Ok(easy)
    }

    /// Runs the transfer, handing every body chunk to `sink`. A sink error
    /// aborts the transfer and is returned instead of curl's write error.
    fn perform<F>(&self, url: &str, mut sink: F) -> Result<u64, TransportError>
    where
        F: FnMut(&[u8]) -> std::io::Result<()>,
    {
        let mut easy = self.easy(url)?;
        let mut written = 0u64;
        let mut sink_error: Option<std::io::Error> = None;
        let result = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match sink(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    sink_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };
        if let Some(e) = sink_error {
            return Err(TransportError::Io(e));
        }
        result?;

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Http(code));
        }
        Ok(written)
    }
}

impl HttpClient for CurlClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let mut body = Vec::new();
        self.perform(url, |data| {
            body.extend_from_slice(data);
            Ok(())
        })?;
        Ok(body)
    }

    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64, TransportError> {
        self.perform(url, |data| out.write_all(data))
    }
}

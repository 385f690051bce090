//! In-memory `HttpClient` for unit tests: canned responses per URL and a call log.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::Mutex;

use super::HttpClient;
use crate::retry::TransportError;

#[derive(Debug, Clone)]
pub(crate) enum FakeResponse {
    Body(Vec<u8>),
    Status(u32),
    /// Connection refused.
    Refused,
}

impl FakeResponse {
    pub(crate) fn text(s: &str) -> Self {
        FakeResponse::Body(s.as_bytes().to_vec())
    }
}

#[derive(Default)]
pub(crate) struct FakeClient {
    /// Responses are consumed in order; the last one repeats.
    routes: Mutex<HashMap<String, VecDeque<FakeResponse>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(&self, url: &str, responses: Vec<FakeResponse>) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next(&self, url: &str) -> FakeResponse {
        self.calls.lock().unwrap().push(url.to_string());
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(FakeResponse::Status(404)),
            None => FakeResponse::Status(404),
        }
    }
}

impl HttpClient for FakeClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        match self.next(url) {
            FakeResponse::Body(b) => Ok(b),
            FakeResponse::Status(code) => Err(TransportError::Http(code)),
            FakeResponse::Refused => Err(TransportError::Curl(curl::Error::new(7))),
        }
    }

    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64, TransportError> {
        let body = self.get(url)?;
        out.write_all(&body)?;
        Ok(body.len() as u64)
    }
}

//! Retry loop: run an async attempt until success or the policy says stop.

use std::future::Future;

use super::classify;
use super::error::TransportError;
use super::policy::{RetryDecision, RetryPolicy};

/// Last error of a request that could not be completed, with the attempts spent.
#[derive(Debug)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub error: TransportError,
}

/// Runs `f` until it succeeds or the retry policy says to stop. Each retry is
/// logged and preceded by the policy's fixed delay.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut f: F,
) -> Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut attempt = 1u32;
    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(error) => {
                let kind = classify::classify(&error);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => {
                        return Err(RetryExhausted {
                            attempts: attempt,
                            error,
                        })
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            url,
                            attempt,
                            max_attempts = policy.max_attempts,
                            error = %error,
                            "request failed, retrying in {:?}",
                            d
                        );
                        tokio::time::sleep(d).await;
                        attempt += 1;
                    }
                }
            }
        }
    }
}

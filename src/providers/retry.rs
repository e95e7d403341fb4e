// Rate-limit retry with a fixed delay and a bounded number of attempts

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use super::types::ProviderError;
use crate::config::constants::{RATE_LIMIT_DELAY_SECS, RATE_LIMIT_MAX_RETRIES};
use crate::config::RetryConfig;

/// Returned as the completion text when the rate limit never clears
pub const RATE_LIMIT_FALLBACK: &str = "Error: Unable to process request due to API rate limit.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(RATE_LIMIT_DELAY_SECS),
            max_retries: RATE_LIMIT_MAX_RETRIES,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            delay: config.delay(),
            max_retries: config.max_retries,
        }
    }
}

/// Run `f`, retrying only on [`ProviderError::RateLimited`].
///
/// After `max_retries` rate-limited retries the call resolves to
/// [`RATE_LIMIT_FALLBACK`] instead of an error. Every other error is
/// returned immediately.
pub async fn with_rate_limit_retry<F, Fut>(policy: RetryPolicy, f: F) -> Result<String>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut retries = 0;

    loop {
        match f().await {
            Ok(text) => return Ok(text),
            Err(e) if is_rate_limited(&e) => {
                if retries >= policy.max_retries {
                    tracing::warn!(
                        retries,
                        "Rate limit persisted after retries; returning degraded response"
                    );
                    return Ok(RATE_LIMIT_FALLBACK.to_string());
                }
                retries += 1;
                tracing::warn!(
                    "Rate limited (retry {}/{}), retrying in {:?}",
                    retries,
                    policy.max_retries,
                    policy.delay
                );
                sleep(policy.delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn is_rate_limited(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<ProviderError>(),
        Some(ProviderError::RateLimited { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn rate_limited() -> anyhow::Error {
        ProviderError::RateLimited {
            provider: "test".to_string(),
        }
        .into()
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_once_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let start = Instant::now();

        let result = with_rate_limit_retry(RetryPolicy::default(), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(rate_limited())
            } else {
                Ok("answer".to_string())
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_rate_limit_degrades_to_text() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy {
            delay: Duration::from_secs(5),
            max_retries: 3,
        };

        let result = with_rate_limit_retry(policy, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(rate_limited())
        })
        .await
        .unwrap();

        assert_eq!(result, RATE_LIMIT_FALLBACK);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_other_errors_propagate_without_retry() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_rate_limit_retry(RetryPolicy::default(), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(anyhow::anyhow!("connection refused"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_detected_through_context() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_rate_limit_retry(RetryPolicy::default(), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(rate_limited()).context("completion failed")
            } else {
                Ok("ok".to_string())
            }
        })
        .await
        .unwrap();
        assert_eq!(result, "ok");
    }
}

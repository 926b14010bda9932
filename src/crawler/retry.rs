//! Retry policy for page fetches
//!
//! The policy is independent of the HTTP client: it wraps any async
//! operation that fails with a [`FetchError`] and decides, per error, whether
//! another attempt is worthwhile.

use crate::config::FetcherConfig;
use crate::crawler::fetcher::FetchError;
use std::future::Future;
use std::time::Duration;

/// Bounded retry with linearly increasing backoff
///
/// | Attempt outcome | Action |
/// |-----------------|--------|
/// | Success | Return the value |
/// | Retryable error, retries left | Sleep `n × backoff_step`, try again |
/// | Retryable error, no retries left | `FetchError::Exhausted` |
/// | Non-retryable error | Return it immediately |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_step: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_step: Duration) -> Self {
        Self {
            max_retries,
            backoff_step,
        }
    }

    pub fn from_config(config: &FetcherConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.backoff_step_ms),
        )
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before the given retry (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.backoff_step * retry
    }

    /// Runs `op` until it succeeds, fails permanently, or the budget runs out
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 1;

        loop {
            let error = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            // Permanent failures skip the remaining budget
            if !error.is_retryable() {
                return Err(error);
            }

            if attempt > self.max_retries {
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            // Linear backoff: step, 2 × step, 3 × step, ...
            let delay = self.backoff(attempt);
            tracing::warn!(
                "Attempt {}/{} failed ({}), retrying in {:?}",
                attempt,
                self.max_attempts(),
                error,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> FetchError {
        FetchError::Status {
            url: "https://jobs.example.com/search".to_string(),
            status: 503,
        }
    }

    fn not_found() -> FetchError {
        FetchError::Status {
            url: "https://jobs.example.com/search".to_string(),
            status: 404,
        }
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(3));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_from_config() {
        let config = FetcherConfig {
            max_retries: 2,
            backoff_step_ms: 250,
            ..FetcherConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy, RetryPolicy::new(2, Duration::from_millis(250)));
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result = policy
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 1 {
                        Err(unavailable())
                    } else {
                        Ok("page")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "page");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(unavailable()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(FetchError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, FetchError::Status { status: 503, .. }));
            }
            other => panic!("expected exhausted error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(not_found()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(unavailable()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(FetchError::Exhausted { attempts: 1, .. })
        ));
    }
}

//! Bounded retry for provider calls.
//!
//! Only timeouts are retried. The delay is fixed and is not applied after the
//! final attempt, so the worst-case added latency is `(attempts - 1) * delay`.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::types::CompletionError;

/// Retry behavior for completion calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub attempts: u32,
    /// Wait between a timed-out attempt and the next one
    pub delay: Duration,
    /// Per-attempt request timeout
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            delay: Duration::from_secs(3),
            request_timeout: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// Worst-case time spent sleeping between attempts
    pub fn total_backoff(&self) -> Duration {
        self.delay * self.attempts.saturating_sub(1)
    }
}

/// Outcome of a single failed attempt
#[derive(Debug)]
pub enum AttemptError {
    /// The attempt hit its timeout; eligible for retry
    Timeout,
    /// Any other failure; returned without retrying
    Fatal(CompletionError),
}

impl From<CompletionError> for AttemptError {
    fn from(e: CompletionError) -> Self {
        AttemptError::Fatal(e)
    }
}

/// Run `attempt` until it succeeds, fails fatally, or every attempt timed out.
/// The closure receives the 1-based attempt number.
pub async fn retry_on_timeout<T, F, Fut>(
    policy: &RetryPolicy,
    mut attempt: F,
) -> Result<T, CompletionError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let attempts = policy.attempts.max(1);

    for n in 1..=attempts {
        match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(e)) => return Err(e),
            Err(AttemptError::Timeout) => {
                warn!("Completion attempt {}/{} timed out", n, attempts);
                if n < attempts {
                    debug!("Retrying in {:?}", policy.delay);
                    sleep(policy.delay).await;
                }
            }
        }
    }

    Err(CompletionError::AllRetriesFailed { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(100),
            request_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 2);
        assert_eq!(policy.delay, Duration::from_secs(3));
        assert_eq!(policy.request_timeout, Duration::from_secs(20));
        assert_eq!(policy.total_backoff(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_two_timeouts_wait_one_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = fast_policy(2);
        let started = Instant::now();

        let counter = calls.clone();
        let result: Result<(), _> = retry_on_timeout(&policy, |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AttemptError::Timeout)
            }
        })
        .await;

        let elapsed = started.elapsed();
        assert_eq!(result, Err(CompletionError::AllRetriesFailed { attempts: 2 }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(elapsed >= policy.delay);
        assert!(elapsed < policy.delay * 2);
    }

    #[tokio::test]
    async fn test_success_after_timeout() {
        let policy = fast_policy(3);
        let result = retry_on_timeout(&policy, |n| async move {
            if n == 1 {
                Err(AttemptError::Timeout)
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = retry_on_timeout(&fast_policy(3), |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AttemptError::Fatal(CompletionError::Transport(
                    "connection reset".to_string(),
                )))
            }
        })
        .await;

        assert_eq!(
            result,
            Err(CompletionError::Transport("connection reset".to_string()))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let result = retry_on_timeout(&fast_policy(0), |_| async { Ok::<_, AttemptError>("ok") }).await;
        assert_eq!(result, Ok("ok"));
    }
}

//! Retry policies for failed acquisitions

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{PoolError, PoolResult};

/// Decision function for [`RetryPolicy::Custom`].
///
/// Receives the error of the failed attempt and its 1-based attempt number.
pub type RetryDecider = Arc<dyn Fn(PoolError, usize) -> RetryDecision + Send + Sync>;

/// What to do after a failed acquisition attempt
#[derive(Debug)]
pub enum RetryDecision {
    /// Wait, then make another attempt
    RetryAfter(Duration),
    /// Stop and surface this error
    Fail(PoolError),
}

/// Retry policy wrapped around `acquire`
///
/// # Examples
///
/// ```
/// use slotpool::{PoolError, RetryDecision, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::fixed(2, Duration::from_millis(10));
/// assert!(matches!(
///     policy.decide(PoolError::PoolFull, 1),
///     RetryDecision::RetryAfter(_)
/// ));
/// assert!(matches!(
///     policy.decide(PoolError::PoolFull, 3),
///     RetryDecision::Fail(PoolError::RetriesExhausted { attempts: 3, .. })
/// ));
/// ```
#[derive(Clone)]
pub enum RetryPolicy {
    /// Retry `PoolFull` up to `retry_count` times, waiting a fixed delay.
    /// Any other error fails immediately.
    Fixed {
        retry_count: usize,
        wait_before_retry: Duration,
    },

    /// Caller-supplied decision for every failure
    Custom(RetryDecider),
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryPolicy::Fixed {
                retry_count,
                wait_before_retry,
            } => f
                .debug_struct("Fixed")
                .field("retry_count", retry_count)
                .field("wait_before_retry", wait_before_retry)
                .finish(),
            RetryPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl RetryPolicy {
    /// Retry `PoolFull` up to `retry_count` times, waiting between tries
    pub fn fixed(retry_count: usize, wait_before_retry: Duration) -> Self {
        RetryPolicy::Fixed {
            retry_count,
            wait_before_retry,
        }
    }

    /// Let `decide` handle every failure
    pub fn custom<F>(decide: F) -> Self
    where
        F: Fn(PoolError, usize) -> RetryDecision + Send + Sync + 'static,
    {
        RetryPolicy::Custom(Arc::new(decide))
    }

    /// Decide how to continue after `attempt` failed with `error`
    pub fn decide(&self, error: PoolError, attempt: usize) -> RetryDecision {
        match self {
            RetryPolicy::Fixed {
                retry_count,
                wait_before_retry,
            } => {
                if !error.is_pool_full() {
                    RetryDecision::Fail(error)
                } else if attempt <= *retry_count {
                    RetryDecision::RetryAfter(*wait_before_retry)
                } else {
                    RetryDecision::Fail(PoolError::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(error),
                    })
                }
            }
            RetryPolicy::Custom(decide) => decide(error, attempt),
        }
    }
}

/// Run `attempt` until it succeeds or `policy` gives up.
///
/// Works with any acquire-shaped operation, not only [`Pool`](crate::Pool).
/// The wait between attempts only suspends the calling task.
pub async fn retry_acquire<T, F, Fut>(policy: &RetryPolicy, attempt: F) -> PoolResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PoolResult<T>>,
{
    retry_with_hook(policy, attempt, || {}).await
}

pub(crate) async fn retry_with_hook<T, F, Fut, H>(
    policy: &RetryPolicy,
    mut attempt: F,
    on_wait: H,
) -> PoolResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PoolResult<T>>,
    H: Fn(),
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let error = match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match policy.decide(error, attempts) {
            RetryDecision::RetryAfter(wait) => {
                tracing::warn!(attempt = attempts, ?wait, "acquire failed, retrying");
                on_wait();
                if !wait.is_zero() {
                    tokio::time::sleep(wait).await;
                }
            }
            RetryDecision::Fail(error) => return Err(error),
        }
    }
}

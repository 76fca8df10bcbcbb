//! Bounded exponential-backoff retry
//!
//! One attempt is in flight at a time; the delay between attempts is a
//! cooperative `tokio::time::sleep`, so other tasks keep running while a
//! fetch backs off.

use crate::config::RetryConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry budget for a fallible async operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations, including the first
    pub max_attempts: u32,

    /// Delay after the first failure
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay slept after the failure of zero-based `attempt`
    ///
    /// Pure exponential backoff with no jitter: `initial_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Runs `operation` until it succeeds or the attempt budget is spent
///
/// # Behavior
///
/// | Outcome of attempt `n` | Action |
/// |------------------------|--------|
/// | `Ok` | Return the value |
/// | `Err`, attempts remain | Sleep `initial_delay * 2^n`, try again |
/// | `Err`, budget spent | Return that error unchanged |
///
/// A `max_attempts` of zero is treated as one.
///
/// # Example
///
/// ```
/// use llmstxt::crawler::{retry, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test_block_on(async {
/// let policy = RetryPolicy { max_attempts: 2, initial_delay: Duration::from_millis(1) };
/// let value: Result<u32, String> = retry(&policy, || async { Ok(7) }).await;
/// assert_eq!(value, Ok(7));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    retry_when(policy, operation, |_| true).await
}

/// [`retry`] that stops early on errors `is_transient` rejects
///
/// A rejected error is returned at once, without sleeping, however many
/// attempts remain.
pub async fn retry_when<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_transient: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt + 1 >= max_attempts {
                    return Err(e);
                }
                if !is_transient(&e) {
                    tracing::debug!("Attempt {} failed permanently: {}", attempt + 1, e);
                    return Err(e);
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "Attempt {}/{} failed: {}. Retrying in {}ms...",
                    attempt + 1,
                    max_attempts,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

//! # Backoff
//!
//! Retry with exponential backoff and jitter around any fallible async operation.
//!
//! ## Delay
//!
//! After failed attempt `n` (0-indexed) the caller sleeps for
//! `min(base_delay * backoff_factor^n + jitter, max_delay)`, where `jitter` is drawn
//! uniformly from `[0, policy.jitter)`. Delays have millisecond resolution.
//!
//! ## Termination
//!
//! - At most `max_retries + 1` attempts
//! - Stops right away when the retry predicate rejects an error
//! - Exhausted retries are reported through [`AttemptOutcome`], never raised
use std::{fmt, future::Future, sync::Arc, time::Duration};

use rand::Rng;
use tokio::time::sleep;
use tracing::warn;

use crate::error::PolicyError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
pub const DEFAULT_JITTER: Duration = Duration::from_millis(1_000);

type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

pub struct RetryPolicy<E> {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
    jitter: Duration,
    retry_if: RetryPredicate<E>,
}

impl<E> RetryPolicy<E> {
    pub fn new(
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_factor: f64,
    ) -> Result<Self, PolicyError> {
        if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            return Err(PolicyError::BackoffFactor(backoff_factor));
        }

        if base_delay > max_delay {
            return Err(PolicyError::DelayBounds {
                base: base_delay,
                max: max_delay,
            });
        }

        Ok(Self {
            max_retries,
            base_delay,
            max_delay,
            backoff_factor,
            jitter: DEFAULT_JITTER,
            retry_if: Arc::new(|_| true),
        })
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_if = Arc::new(predicate);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn should_retry(&self, error: &E) -> bool {
        (self.retry_if)(error)
    }

    /// Delay scheduled after the failed attempt with 0-based index `attempt`.
    pub fn delay_for(&self, attempt: u32, jitter: Duration) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let exponential = self.base_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);

        // inf when the exponent overflows, which min() still caps
        let capped = (exponential + jitter.as_millis() as f64).min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped.round() as u64)
    }

    fn sample_jitter(&self) -> Duration {
        let bound = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if bound == 0 {
            return Duration::ZERO;
        }

        Duration::from_millis(rand::rng().random_range(0..bound))
    }
}

impl<E> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            jitter: DEFAULT_JITTER,
            retry_if: Arc::new(|_| true),
        }
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_retries: self.max_retries,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            backoff_factor: self.backoff_factor,
            jitter: self.jitter,
            retry_if: Arc::clone(&self.retry_if),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("jitter", &self.jitter)
            .finish_non_exhaustive()
    }
}

/// Result of one retry-wrapped call.
#[derive(Debug)]
pub struct AttemptOutcome<T, E> {
    result: Result<T, E>,
    attempts: u32,
    total_delay: Duration,
}

impl<T, E> AttemptOutcome<T, E> {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&E> {
        self.result.as_ref().err()
    }

    /// 1-based count of attempts taken.
    pub fn attempts_made(&self) -> u32 {
        self.attempts
    }

    /// Sum of the backoff delays slept between attempts.
    pub fn total_delay(&self) -> Duration {
        self.total_delay
    }

    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

pub async fn execute<T, E, F, Fut>(mut operation: F, policy: &RetryPolicy<E>) -> AttemptOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut attempt = 0;
    let mut total_delay = Duration::ZERO;

    loop {
        let error = match operation().await {
            Ok(value) => {
                return AttemptOutcome {
                    result: Ok(value),
                    attempts: attempt + 1,
                    total_delay,
                };
            }
            Err(error) => error,
        };

        if attempt == policy.max_retries || !policy.should_retry(&error) {
            return AttemptOutcome {
                result: Err(error),
                attempts: attempt + 1,
                total_delay,
            };
        }

        let delay = policy.delay_for(attempt, policy.sample_jitter());
        warn!(
            "Attempt {} failed, retrying in {}ms: {error}",
            attempt + 1,
            delay.as_millis()
        );

        sleep(delay).await;
        total_delay += delay;
        attempt += 1;
    }
}

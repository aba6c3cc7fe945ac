//! Retry with exponential backoff and additive jitter
//!
//! [`RetryExecutor`] runs an async operation until it succeeds, the
//! [`RetryPolicy`] refuses another try, or the retry budget is spent. The
//! last error is always handed back to the caller inside [`RetryError`], so
//! fallback logic further up can surface it unchanged.
//!
//! A budget of `max_retries = 3` means four attempts in total.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Terminal failure of a retried operation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    #[error("All retry attempts exhausted after {attempts} tries: {source}")]
    Exhausted { attempts: u32, source: E },

    /// The policy stopped the loop
    #[error("Operation failed with non-retryable error: {source}")]
    NonRetryable { attempts: u32, source: E },
}

impl<E> RetryError<E> {
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::NonRetryable { attempts, .. } => *attempts,
        }
    }

    /// The error returned by the final attempt.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { source, .. } | Self::NonRetryable { source, .. } => source,
        }
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Result plus what it took to get there
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    pub attempts: u32,
    /// Sleeps taken between attempts, in order.
    pub delays: Vec<Duration>,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }

    pub fn total_delay(&self) -> Duration {
        self.delays.iter().sum()
    }
}

/// Decides whether a failed attempt should be retried
pub trait RetryPolicy<E> {
    /// `attempt` is the zero-based index of the attempt that failed.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the configured backoff
    Retry,
    /// Retry after this specific delay
    RetryAfter(Duration),
    Stop,
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    Fixed(Duration),
    /// `initial_delay * base^attempt`, capped at `max_delay`
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Doubling backoff from `initial_delay`.
    pub const fn doubling(initial_delay: Duration, max_delay: Duration) -> Self {
        Self::Exponential { initial_delay, base: 2.0, max_delay }
    }

    /// Delay before the retry that follows failed attempt `attempt`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay = initial_delay.as_secs_f64() * base.powi(exponent);
                if delay.is_finite() && delay < max_delay.as_secs_f64() {
                    Duration::from_secs_f64(delay)
                } else {
                    *max_delay
                }
            }
        }
    }
}

/// Randomness added on top of the backoff delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Jitter {
    None,
    /// Uniform in `[0, max)`, added to the delay
    Additive(Duration),
}

impl Jitter {
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            Self::None => delay,
            Self::Additive(max) => {
                let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
                if max_ms == 0 {
                    return delay;
                }
                let jitter_ms = rand::thread_rng().gen_range(0..max_ms);
                delay.saturating_add(Duration::from_millis(jitter_ms))
            }
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub backoff: BackoffStrategy,
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffStrategy::doubling(Duration::from_secs(1), Duration::from_secs(30)),
            jitter: Jitter::Additive(Duration::from_secs(1)),
        }
    }
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self { max_retries: 0, backoff: BackoffStrategy::Fixed(Duration::ZERO), jitter: Jitter::None }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if let BackoffStrategy::Exponential { base, .. } = &self.backoff {
            if *base < 1.0 {
                return Err("exponential base must be at least 1".to_string());
            }
        }
        Ok(())
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Fixed(delay);
        self
    }

    pub fn exponential_backoff(mut self, initial_delay: Duration, base: f64, max_delay: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Exponential { initial_delay, base, max_delay };
        self
    }

    pub fn jitter(mut self, max: Duration) -> Self {
        self.config.jitter = Jitter::Additive(max);
        self
    }

    pub fn no_jitter(mut self) -> Self {
        self.config.jitter = Jitter::None;
        self
    }

    pub fn build(self) -> Result<RetryConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// The main retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    pub const fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute `operation`, passing it the zero-based attempt index.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    #[instrument(skip_all, fields(max_retries = self.config.max_retries))]
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut delays = Vec::new();
        let mut attempt = 0;

        loop {
            let attempts = attempt + 1;
            let error = match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempts, "operation succeeded after retrying");
                    }
                    return RetryOutcome { result: Ok(value), attempts, delays };
                }
                Err(error) => error,
            };

            let delay = match self.policy.should_retry(&error, attempt) {
                RetryDecision::Stop => {
                    debug!(attempts, error = %error, "error is not retryable");
                    return RetryOutcome {
                        result: Err(RetryError::NonRetryable { attempts, source: error }),
                        attempts,
                        delays,
                    };
                }
                _ if attempt >= self.config.max_retries => {
                    warn!(attempts, error = %error, "retry attempts exhausted");
                    return RetryOutcome {
                        result: Err(RetryError::Exhausted { attempts, source: error }),
                        attempts,
                        delays,
                    };
                }
                RetryDecision::Retry => {
                    self.config.jitter.apply(self.config.backoff.calculate_delay(attempt))
                }
                RetryDecision::RetryAfter(custom) => custom,
            };

            warn!(attempt = attempts, delay_ms = delay.as_millis() as u64, error = %error, "attempt failed, retrying");
            tokio::time::sleep(delay).await;
            delays.push(delay);
            attempt += 1;
        }
    }
}

/// Pre-defined retry policies
pub mod policies {
    use super::{RetryDecision, RetryPolicy};

    /// Retries on any error
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Retry
        }
    }

    /// Retries while `predicate(error, attempt)` holds
    #[derive(Debug, Clone)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        pub const fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E, u32) -> bool,
    {
        fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
            if (self.predicate)(error, attempt) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }
}

//! Backoff for [`GenerationClient`](crate::client::GenerationClient) calls.
//!
//! Client-side retries with exponential backoff and jitter. Only transient
//! failures are retried (transport errors, 429 and gateway 5xx); the proxy
//! itself never retries.

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

use crate::client::ClientError;

/// How many times a proxy call is attempted and how long to wait between tries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Growth factor applied per retry
    pub backoff_multiplier: f64,
    /// Randomize delays so concurrent clients spread out
    pub use_jitter: bool,
    /// Jitter as a fraction of the delay (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            use_jitter: true,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Two attempts, 500ms initial delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that performs exactly one attempt.
    pub fn none() -> Self {
        Self::default().with_max_attempts(1)
    }

    /// Total attempts, the first one included. Zero behaves as one.
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Wait before the first retry.
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Ceiling for the backoff, applied before jitter.
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub const fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    /// Transport failures, 429 and gateway 5xx are worth another attempt.
    pub fn should_retry(&self, error: &ClientError) -> bool {
        error.is_retryable()
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);

        let delay = Duration::from_millis(base_delay as u64).min(self.max_delay);

        if self.use_jitter {
            self.add_jitter(delay)
        } else {
            delay
        }
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        let mut rng = rand::thread_rng();
        let jitter_range = delay.as_millis() as f64 * self.jitter_factor;
        if jitter_range <= 0.0 {
            return delay;
        }
        let jitter = rng.gen_range(-jitter_range..=jitter_range);

        let new_delay = delay.as_millis() as f64 + jitter;
        Duration::from_millis(new_delay.max(0.0) as u64)
    }
}

/// Runs a proxy call under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Returns the first success, or the last error once attempts run out
    /// or a non-retryable error comes back.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ClientError>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    attempt += 1;
                    if attempt >= attempts || !self.policy.should_retry(&error) {
                        return Err(error);
                    }
                    let delay = self.policy.calculate_delay(attempt - 1);
                    tracing::debug!(
                        "Retrying after {:?} (attempt {}/{}): {}",
                        delay,
                        attempt + 1,
                        attempts,
                        error
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

//! Retry policy for ARM requests.
//!
//! Provides exponential backoff with optional jitter. The ARM client consults
//! [`RetryPolicy::delay_for_attempt`] between attempts unless the service sent
//! a `Retry-After` header.
//!
//! # Example
//!
//! ```rust
//! use azurerm_network::retry::{JitterStrategy, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::exponential(3, Duration::from_millis(500), Duration::from_secs(30))
//!     .with_jitter(JitterStrategy::None);
//!
//! assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(500));
//! assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Jitter strategy for adding randomness to delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// Use the exact calculated delay.
    None,

    /// delay = random(0, calculated_delay)
    #[default]
    Full,

    /// delay = calculated_delay/2 + random(0, calculated_delay/2)
    Equal,
}

impl JitterStrategy {
    /// Apply jitter to a calculated delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        let mut rng = rand::thread_rng();
        let delay_millis = delay.as_millis() as f64;

        let jittered_millis = match self {
            Self::None => delay_millis,
            Self::Full => {
                if delay_millis > 0.0 {
                    rng.gen_range(0.0..delay_millis)
                } else {
                    0.0
                }
            }
            Self::Equal => {
                let half = delay_millis / 2.0;
                if half > 0.0 {
                    half + rng.gen_range(0.0..half)
                } else {
                    0.0
                }
            }
        };

        Duration::from_millis(jittered_millis.max(0.0) as u64)
    }
}

/// How many times and how long to wait between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 means only the initial attempt).
    pub max_retries: u32,

    /// Initial delay before the first retry.
    pub initial_delay: Duration,

    /// Maximum delay between retries.
    pub max_delay: Duration,

    /// Growth factor: delay = initial_delay * multiplier^attempt
    pub multiplier: f64,

    /// Jitter strategy.
    pub jitter: JitterStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: JitterStrategy::default(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with exponential backoff and full jitter.
    pub fn exponential(max_retries: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            multiplier: 2.0,
            jitter: JitterStrategy::Full,
        }
    }

    /// Replace the jitter strategy.
    pub fn with_jitter(mut self, jitter: JitterStrategy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate the delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_millis =
            self.initial_delay.as_millis() as f64 * self.multiplier.powf(f64::from(attempt));
        let base_delay = Duration::from_millis(base_millis.min(u64::MAX as f64) as u64);
        self.jitter.apply(base_delay.min(self.max_delay))
    }

    /// Check if retrying should continue based on attempt count.
    pub fn should_continue(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

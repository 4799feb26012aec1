//! Retry schedule for webhook delivery

use crate::config::NotifierConfig;
use rand::Rng;
use std::time::Duration;

/// Exponential backoff with a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base: Duration,
    /// Upper bound on any delay before jitter
    pub max: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_retries,
            base,
            max: max.max(base),
        }
    }

    pub fn from_config(config: &NotifierConfig) -> Self {
        Self::new(config.max_retries, config.base_backoff(), config.max_backoff())
    }

    /// Total attempts per alert, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`, capped
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |d| d.min(self.max))
    }

    /// `delay(attempt)` with ±10% jitter
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        jitter(self.delay(attempt), &mut rand::thread_rng())
    }
}

/// Scale a delay by a random factor in [0.9, 1.1]
pub fn jitter<R: Rng + ?Sized>(delay: Duration, rng: &mut R) -> Duration {
    delay.mul_f64(rng.gen_range(0.9..=1.1))
}

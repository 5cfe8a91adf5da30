//! Exponential backoff schedule
//!
//! Pure delay arithmetic; nothing here sleeps. The retry strategy embeds a
//! schedule in the plan it hands back to the caller.

use std::time::Duration;

/// `next_delay(0) = base`, `next_delay(n) = min(base * 2^n, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    max_attempts: u32,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max,
            max_attempts,
        }
    }

    pub fn next_delay(&self, attempt: u32) -> Duration {
        if attempt >= 64 {
            return self.max;
        }
        let factor = 1u64 << attempt;
        let delay = self
            .base
            .checked_mul(factor.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(self.max);
        delay.min(self.max)
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(30), 3)
    }
}

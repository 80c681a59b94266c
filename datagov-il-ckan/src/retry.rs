use std::time::Duration;

use crate::client::GatewayError;

/// Bounded retry policy for catalog action calls.
///
/// A call is attempted at most `max_retries + 1` times. Between attempts the
/// gateway waits `base_delay * 2^(attempt - 1)`, capped at `max_delay`; a zero
/// `base_delay` retries immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without waiting
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Same delays, different retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Total number of attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Decide whether a failed attempt should be retried.
///
/// Transport failures and 5xx responses are transient; every other failure
/// is a well-formed rejection and is surfaced immediately.
pub fn should_retry(error: &GatewayError, attempts_remaining: u32) -> bool {
    if attempts_remaining == 0 {
        return false;
    }
    match error {
        GatewayError::Network { .. } => true,
        GatewayError::HttpStatus { status, .. } => *status >= 500,
        GatewayError::Application { .. } => false,
    }
}

//! Bounded retry with exponential backoff
//!
//! - Max attempts: 3 by default
//! - Backoff: 250ms doubling per failure, capped at 4s, ±25% jitter
//! - Timeouts and input errors are never retried
//!
//! Attempts are strictly sequential. Callers drive a `Retrying` session
//! per logical call, so each attempt can borrow caller state such as a
//! live output sink.

use crate::errors::{ClientError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Default number of attempts per logical call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff
pub const BASE_DELAY_MS: u64 = 250;

/// Maximum delay cap
pub const MAX_DELAY_MS: u64 = 4000;

/// Retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first one
    max_attempts: u32,

    /// Base delay in milliseconds
    base_delay_ms: u64,

    /// Maximum delay cap in milliseconds
    max_delay_ms: u64,

    /// Enable jitter
    enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    /// Create retry policy with default settings
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Create retry policy with custom settings
    pub fn with_config(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms,
            enable_jitter: true,
        }
    }

    /// Start a retry session for one logical call
    pub fn start(&self) -> Retrying<'_> {
        Retrying {
            policy: self,
            attempt: 1,
        }
    }

    /// Delay before the attempt following failed attempt `attempt`
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let exponential_delay = self.base_delay_ms.saturating_mul(2u64.pow(exponent));
        let delay_ms = exponential_delay.min(self.max_delay_ms);

        // ±25% random variation
        let final_delay = if self.enable_jitter && delay_ms > 0 {
            let jitter = (delay_ms / 4) as f64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter;
            ((delay_ms as f64) + random_jitter).max(0.0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Get max attempts
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Attempt bookkeeping for one logical call
#[derive(Debug)]
pub struct Retrying<'a> {
    policy: &'a RetryPolicy,
    attempt: u32,
}

impl Retrying<'_> {
    /// Current attempt, 1-based
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failed attempt. Returns `Ok(())` once the backoff has
    /// elapsed and another attempt may start, or the error that ends the
    /// logical call. Cancelling `cancel` cuts the backoff short.
    pub async fn failed(&mut self, err: ClientError, cancel: &CancellationToken) -> Result<()> {
        if !err.is_retryable() {
            return Err(err);
        }

        warn!(
            attempt = self.attempt,
            max_attempts = self.policy.max_attempts,
            "Attempt failed: {}",
            err
        );

        if self.attempt >= self.policy.max_attempts {
            error!(attempts = self.attempt, "Maximum retry attempts reached");
            return Err(ClientError::RetriesExhausted {
                attempts: self.attempt,
                source: Box::new(err),
            });
        }

        let delay = self.policy.calculate_delay(self.attempt);
        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = sleep(delay) => {}
            }
        }
        self.attempt += 1;
        Ok(())
    }
}

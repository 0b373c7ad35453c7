//! Wall-clock deadline for a logical call
//!
//! The deadline spans every attempt of the call. When it fires, the
//! cancellation token is tripped and the in-flight future is dropped,
//! which releases any open response body.

use crate::errors::{ClientError, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Default deadline for one logical chat call (80 seconds)
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(80);

/// Deadline policy; `None` disables it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    duration: Option<Duration>,
}

impl Default for Deadline {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE)
    }
}

impl Deadline {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration: Some(duration),
        }
    }

    /// No deadline; the call runs until the stream terminates
    pub fn none() -> Self {
        Self { duration: None }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Run `operation` under the deadline.
    ///
    /// The timer is disarmed as soon as `operation` resolves, so it can
    /// never cancel a call that has already returned.
    pub async fn run<F, T>(&self, cancel: &CancellationToken, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let Some(duration) = self.duration else {
            return operation.await;
        };

        match tokio::time::timeout(duration, operation).await {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                let duration_ms = duration.as_millis() as u64;
                warn!(duration_ms, "Chat deadline exceeded, cancelling request");
                Err(ClientError::Timeout { duration_ms })
            }
        }
    }
}

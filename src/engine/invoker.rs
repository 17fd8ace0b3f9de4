//! Deadline enforcement for outbound engine calls.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::config::DEFAULT_CALL_TIMEOUT_MS;
use crate::error::SourceError;

/// Deadline applied when no other is configured.
pub const DEFAULT_CALL_DEADLINE: Duration = Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS);

/// Runs engine calls under a fixed deadline.
///
/// A call that outlives the deadline is dropped, which cancels the request
/// and releases its connection, and the caller receives
/// [`SourceError::Timeout`]. A call that finishes first drops the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutInvoker {
    deadline: Duration,
}

impl Default for TimeoutInvoker {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_DEADLINE)
    }
}

impl TimeoutInvoker {
    /// Create an invoker with the given deadline.
    #[must_use]
    pub const fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// The deadline applied to each call.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `call`, failing with [`SourceError::Timeout`] once the deadline
    /// passes.
    ///
    /// # Errors
    ///
    /// Returns the call's own error, or [`SourceError::Timeout`] naming
    /// `operation` if the deadline elapsed first.
    pub async fn invoke<T, F>(&self, operation: &str, call: F) -> Result<T, SourceError>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        if let Ok(result) = tokio::time::timeout(self.deadline, call).await {
            result
        } else {
            let elapsed_ms = u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX);
            debug!(operation, elapsed_ms, "engine call abandoned at deadline");
            Err(SourceError::Timeout {
                operation: operation.to_owned(),
                elapsed_ms,
            })
        }
    }
}

//! Fetch context threaded through every layer of the engine.
//!
//! A [`FetchContext`] carries the cancellation signal and an optional
//! deadline for one command invocation. It holds no collaborators: event
//! queues are passed explicitly to the operations that use them.

use std::time::Duration;

use assetctl_core::ApiError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fetch Context
// ============================================================================

/// Cancellation and deadline for one fetch operation.
///
/// Cloning is cheap and clones share the same cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct FetchContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl FetchContext {
    /// Creates a context that is never cancelled unless [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a deadline `timeout` from now. An earlier existing deadline wins.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline. An earlier existing deadline wins.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns the underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the error describing why this context is done, if it is.
    pub fn err(&self) -> Option<ApiError> {
        if self.cancel.is_cancelled() {
            return Some(ApiError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ApiError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Returns true once the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ApiError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => ApiError::Cancelled,
                    () = tokio::time::sleep_until(deadline) => ApiError::DeadlineExceeded,
                }
            }
            None => {
                self.cancel.cancelled().await;
                ApiError::Cancelled
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Retry policy and executor for remote calls.
//!
//! [`RetryExecutor::execute`] runs one remote call up to
//! [`RetryPolicy::max_attempts`] times. Only transient failures (status 429
//! or 5xx) are retried, and the backoff wait is aborted as soon as the
//! [`FetchContext`] is cancelled.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use assetctl_core::{ApiError, CoreError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::context::FetchContext;

/// Default delay between attempts.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

// ============================================================================
// Backoff Kind
// ============================================================================

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// Always `base_delay`.
    Fixed,
    /// `attempt × base_delay`.
    Linear,
    /// `2^(attempt-1) × base_delay`.
    #[default]
    Exponential,
}

impl BackoffKind {
    /// Returns the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Linear => "linear",
            Self::Exponential => "exponential",
        }
    }
}

impl fmt::Display for BackoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BackoffKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" | "constant" => Ok(Self::Fixed),
            "linear" => Ok(Self::Linear),
            "exponential" | "exp" => Ok(Self::Exponential),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown backoff kind: {other} (expected fixed, linear or exponential)"
            ))),
        }
    }
}

/// Computes the wait after a failed `attempt` (1-based).
///
/// The result is capped at `max_delay` unless `max_delay` is zero.
pub fn backoff_delay(
    base_delay: Duration,
    max_delay: Duration,
    kind: BackoffKind,
    attempt: u32,
) -> Duration {
    let factor = match kind {
        BackoffKind::Fixed => 1,
        BackoffKind::Linear => attempt.max(1),
        BackoffKind::Exponential => 2u32.saturating_pow(attempt.saturating_sub(1)),
    };
    let delay = base_delay.saturating_mul(factor);

    if !max_delay.is_zero() && delay > max_delay {
        max_delay
    } else {
        delay
    }
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Immutable retry configuration, read once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay unit for backoff computation.
    pub base_delay: Duration,
    /// Upper bound for a single delay; zero means unbounded.
    pub max_delay: Duration,
    /// How the delay grows.
    pub backoff: BackoffKind,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt budget and default delays.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Sets the attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the delay cap (zero for unbounded).
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff kind.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffKind) -> Self {
        self.backoff = backoff;
        self
    }

    /// Attempt budget, never below one.
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after the given failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        backoff_delay(self.base_delay, self.max_delay, self.backoff, attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: Duration::ZERO,
            backoff: BackoffKind::default(),
        }
    }
}

// ============================================================================
// Attempted
// ============================================================================

/// Outcome of a retried call together with the number of attempts used.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    /// Final value or final categorized error.
    pub outcome: Result<T, ApiError>,
    /// Attempts actually made (1-based, never above the policy budget).
    pub attempts: u32,
}

impl<T> Attempted<T> {
    fn succeeded(value: T, attempts: u32) -> Self {
        Self {
            outcome: Ok(value),
            attempts,
        }
    }

    fn failed(err: ApiError, attempts: u32) -> Self {
        Self {
            outcome: Err(err),
            attempts,
        }
    }
}

// ============================================================================
// Retry Executor
// ============================================================================

/// Wraps remote calls with bounded, cancellable retries.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Creates an executor for the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Returns the policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `op` until it succeeds, fails permanently, exhausts the attempt
    /// budget, or `ctx` is cancelled.
    ///
    /// The in-flight call itself is never interrupted; cancellation is
    /// observed before each attempt and during the backoff wait.
    pub async fn execute<T, F, Fut>(&self, ctx: &FetchContext, mut op: F) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let max_attempts = self.policy.effective_attempts();
        let mut attempt = 1;

        loop {
            if let Some(err) = ctx.err() {
                debug!(attempt, error = %err, "Context done before attempt");
                return Attempted::failed(err, attempt);
            }

            debug!(attempt, max_attempts, "Executing remote call");

            let err = match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(attempts = attempt, "Remote call succeeded after retry");
                    }
                    return Attempted::succeeded(value, attempt);
                }
                Err(e) => classify(&e),
            };

            if !err.is_retryable() {
                debug!(attempt, error = %err, "Permanent failure, not retrying");
                return Attempted::failed(err, attempt);
            }

            if attempt >= max_attempts {
                warn!(
                    attempts = attempt,
                    error = %err,
                    "Remote call failed after all retry attempts exhausted"
                );
                return Attempted::failed(err, attempt);
            }

            let delay = self.policy.delay_for_attempt(attempt);
            warn!(
                attempt,
                max_attempts,
                status = err.status_code(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Remote call failed, retrying"
            );

            tokio::select! {
                biased;
                cancelled = ctx.done() => {
                    debug!(attempt, error = %cancelled, "Backoff interrupted");
                    return Attempted::failed(cancelled, attempt);
                }
                () = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

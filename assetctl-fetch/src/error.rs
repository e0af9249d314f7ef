//! Fetch error types.
//!
//! Remote calls fail with `anyhow::Error`. The payload types here are what a
//! transport attaches to such an error so [`classify`](crate::classify) can
//! recover the category.

use assetctl_core::{ApiError, FieldError};
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Error Payloads
// ============================================================================

/// Problem-details error body returned by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Deserialize)]
#[error("{title}: {detail}")]
pub struct StructuredErrorPayload {
    /// Short summary.
    #[serde(default)]
    pub title: String,
    /// Longer explanation.
    #[serde(default)]
    pub detail: String,
    /// HTTP status code echoed in the body.
    #[serde(default)]
    pub status: Option<i64>,
    /// Problem type URI.
    #[serde(default, rename = "type")]
    pub error_type: String,
    /// Occurrence identifier.
    #[serde(default)]
    pub instance: String,
    /// Field-level validation errors.
    #[serde(default, rename = "errors")]
    pub field_errors: Vec<FieldError>,
}

/// Authentication failure body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Deserialize)]
#[error("unauthorized ({code}): {message}")]
pub struct UnauthorizedPayload {
    /// Machine-readable code.
    #[serde(default)]
    pub code: String,
    /// HTTP status code.
    #[serde(default)]
    pub status: i64,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Reason reported by the server.
    #[serde(default)]
    pub reason: String,
}

/// Non-2xx response without a recognized payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (status {status_code})")]
pub struct HttpErrorPayload {
    /// Human-readable message.
    pub message: String,
    /// HTTP status code.
    pub status_code: i64,
    /// Raw response body.
    pub body: String,
}

/// Marker attached to errors caused by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Marker attached to errors caused by an expired deadline or timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline exceeded")]
pub struct DeadlineElapsed;

// ============================================================================
// Queue Error
// ============================================================================

/// Error returned when an event cannot be published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue was closed or its consumer went away.
    #[error("event queue closed")]
    Closed,

    /// The operation context was cancelled while waiting for a free slot.
    #[error("publish interrupted: {0}")]
    Interrupted(ApiError),
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Closed => ApiError::unknown("event queue closed"),
            QueueError::Interrupted(err) => err,
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// Errors building the platform HTTP client.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Client construction failed.
    #[error("Client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

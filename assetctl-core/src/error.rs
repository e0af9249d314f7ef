//! Core error types for `assetctl`.
//!
//! [`ApiError`] is the closed taxonomy every remote failure is reduced to
//! before it reaches a caller. [`CoreError`] covers local validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Core Error
// ============================================================================

/// Core error type for local `assetctl` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid request input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// ============================================================================
// Field Error
// ============================================================================

/// A single field-level validation failure attached to a structured error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON path or parameter name that failed validation.
    pub location: String,
    /// Human-readable description.
    pub message: String,
}

// ============================================================================
// API Error
// ============================================================================

/// A categorized remote failure.
///
/// Every failure produced by an injected remote call is classified into one
/// of these variants. Only the HTTP-backed variants carry a status code.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    /// Problem-details style error returned by the platform API.
    #[error("{title}: {detail}")]
    Structured {
        /// Short summary of the problem.
        title: String,
        /// Longer explanation.
        detail: String,
        /// HTTP status code, when the payload carried one.
        status: Option<i64>,
        /// Problem type URI.
        #[serde(rename = "type")]
        error_type: String,
        /// Occurrence identifier.
        instance: String,
        /// Field-level validation errors.
        field_errors: Vec<FieldError>,
    },

    /// Authentication or authorization failure.
    #[error("unauthorized ({code}): {message}")]
    Unauthorized {
        /// Machine-readable error code.
        code: String,
        /// HTTP status code.
        status: i64,
        /// Human-readable message.
        message: String,
        /// Reason reported by the server.
        reason: String,
    },

    /// Transport-level HTTP failure without a recognized payload.
    #[error("{message}{}", body_suffix(.body))]
    Generic {
        /// Human-readable message.
        message: String,
        /// HTTP status code.
        status_code: i64,
        /// Response body, already formatted for display.
        body: String,
    },

    /// The operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The operation's deadline expired.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Any failure that could not be categorized.
    #[error("{message}")]
    Unknown {
        /// Display text of the original failure.
        message: String,
    },
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

impl ApiError {
    /// Creates an unknown error from any displayable value.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code, present only for HTTP-backed variants.
    pub fn status_code(&self) -> Option<i64> {
        match self {
            Self::Structured { status, .. } => *status,
            Self::Unauthorized { status, .. } => Some(*status),
            Self::Generic { status_code, .. } => Some(*status_code),
            Self::Cancelled | Self::DeadlineExceeded | Self::Unknown { .. } => None,
        }
    }

    /// Returns a human label for the status code (`"unknown"` when absent).
    pub fn status(&self) -> String {
        self.status_code()
            .and_then(status_text)
            .unwrap_or("unknown")
            .to_string()
    }

    /// Returns true when the failure is transient: status 429 or any 5xx.
    pub fn is_retryable(&self) -> bool {
        matches!(self.status_code(), Some(code) if code == 429 || code >= 500)
    }

    /// Returns true for cancellation or deadline expiry.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Returns the canonical HTTP reason phrase for a status code.
pub fn status_text(code: i64) -> Option<&'static str> {
    let text = match code {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        413 => "Request Entity Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => return None,
    };
    Some(text)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn generic(code: i64) -> ApiError {
        ApiError::Generic {
            message: "request failed".to_string(),
            status_code: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_status_code_only_for_http_variants() {
        assert_eq!(generic(502).status_code(), Some(502));
        assert_eq!(ApiError::Cancelled.status_code(), None);
        assert_eq!(ApiError::DeadlineExceeded.status_code(), None);
        assert_eq!(ApiError::unknown("boom").status_code(), None);

        let structured = ApiError::Structured {
            title: "Bad".to_string(),
            detail: "bad query".to_string(),
            status: None,
            error_type: String::new(),
            instance: String::new(),
            field_errors: vec![],
        };
        assert_eq!(structured.status_code(), None);
    }

    #[test]
    fn test_status_label() {
        assert_eq!(generic(404).status(), "Not Found");
        assert_eq!(generic(599).status(), "unknown");
        assert_eq!(ApiError::Cancelled.status(), "unknown");
    }

    #[test]
    fn test_retryability() {
        assert!(generic(429).is_retryable());
        assert!(generic(500).is_retryable());
        assert!(generic(503).is_retryable());
        assert!(!generic(400).is_retryable());
        assert!(!generic(404).is_retryable());
        assert!(!ApiError::unknown("x").is_retryable());
        assert!(!ApiError::Cancelled.is_retryable());
    }

    #[test]
    fn test_display() {
        let err = ApiError::Generic {
            message: "request failed".to_string(),
            status_code: 500,
            body: "oops".to_string(),
        };
        assert_eq!(err.to_string(), "request failed: oops");
        assert_eq!(generic(500).to_string(), "request failed");

        let auth = ApiError::Unauthorized {
            code: "invalid_token".to_string(),
            status: 401,
            message: "token expired".to_string(),
            reason: "expired".to_string(),
        };
        assert_eq!(auth.to_string(), "unauthorized (invalid_token): token expired");
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(ApiError::Cancelled).unwrap();
        assert_eq!(json["kind"], "cancelled");
    }
}

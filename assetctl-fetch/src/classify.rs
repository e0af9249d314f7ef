//! Error classification.
//!
//! [`classify`] reduces any failure produced by a remote call to an
//! [`ApiError`]. It inspects the whole cause chain, so transports are free to
//! wrap payloads with additional context.

use assetctl_core::ApiError;

use crate::error::{
    Cancelled, DeadlineElapsed, HttpErrorPayload, StructuredErrorPayload, UnauthorizedPayload,
};

/// Bodies longer than this are truncated when they are not JSON.
pub const MAX_BODY_BYTES: usize = 200;

/// Classifies a failure into an [`ApiError`]. Never fails.
///
/// Precedence: an already-categorized error, structured payload,
/// unauthorized payload, generic HTTP payload, cancellation, deadline,
/// and finally `Unknown` with the error's display text.
pub fn classify(err: &anyhow::Error) -> ApiError {
    if let Some(api) = find::<ApiError>(err) {
        return api.clone();
    }

    if let Some(payload) = find::<StructuredErrorPayload>(err) {
        return ApiError::Structured {
            title: payload.title.clone(),
            detail: payload.detail.clone(),
            status: payload.status,
            error_type: payload.error_type.clone(),
            instance: payload.instance.clone(),
            field_errors: payload.field_errors.clone(),
        };
    }

    if let Some(payload) = find::<UnauthorizedPayload>(err) {
        return ApiError::Unauthorized {
            code: payload.code.clone(),
            status: payload.status,
            message: payload.message.clone(),
            reason: payload.reason.clone(),
        };
    }

    if let Some(payload) = find::<HttpErrorPayload>(err) {
        return ApiError::Generic {
            message: payload.message.clone(),
            status_code: payload.status_code,
            body: format_body(&payload.body),
        };
    }

    if find::<Cancelled>(err).is_some() {
        return ApiError::Cancelled;
    }

    if find::<DeadlineElapsed>(err).is_some() || find::<tokio::time::error::Elapsed>(err).is_some()
    {
        return ApiError::DeadlineExceeded;
    }

    ApiError::unknown(format!("{err:#}"))
}

/// Finds a `T` anywhere in the error, including `anyhow` context layers.
fn find<T>(err: &anyhow::Error) -> Option<&T>
where
    T: std::error::Error + Send + Sync + 'static,
{
    err.downcast_ref::<T>()
        .or_else(|| err.chain().find_map(|cause| cause.downcast_ref::<T>()))
}

/// Formats a response body for display.
///
/// JSON bodies are pretty-printed. Anything else longer than
/// [`MAX_BODY_BYTES`] is cut on a char boundary and suffixed with the number
/// of dropped bytes.
pub fn format_body(body: &str) -> String {
    if body.trim().is_empty() {
        return String::new();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Ok(pretty) = serde_json::to_string_pretty(&value) {
            return pretty;
        }
    }

    truncate_body(body, MAX_BODY_BYTES)
}

fn truncate_body(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        return body.to_string();
    }

    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    format!(
        "{}... (truncated {} bytes)",
        &body[..end],
        body.len() - end
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn http_error(status: i64, body: &str) -> anyhow::Error {
        anyhow::Error::new(HttpErrorPayload {
            message: "request failed".to_string(),
            status_code: status,
            body: body.to_string(),
        })
    }

    #[test]
    fn test_structured_payload() {
        let err = anyhow::Error::new(StructuredErrorPayload {
            title: "Invalid query".to_string(),
            detail: "unexpected token".to_string(),
            status: Some(422),
            ..Default::default()
        });

        let classified = classify(&err);
        assert!(matches!(classified, ApiError::Structured { .. }));
        assert_eq!(classified.status_code(), Some(422));
        assert!(!classified.is_retryable());
    }

    #[test]
    fn test_structured_wins_over_wrapping_context() {
        let err = anyhow::Error::new(StructuredErrorPayload {
            title: "Bad".to_string(),
            ..Default::default()
        })
        .context("searching hosts")
        .context("page 3");

        assert!(matches!(classify(&err), ApiError::Structured { .. }));
    }

    #[test]
    fn test_unauthorized_payload() {
        let err = anyhow::Error::new(UnauthorizedPayload {
            code: "invalid_token".to_string(),
            status: 401,
            message: "token expired".to_string(),
            reason: "expired".to_string(),
        });

        let classified = classify(&err);
        assert_eq!(classified.status_code(), Some(401));
        assert_eq!(classified.status(), "Unauthorized");
    }

    #[test]
    fn test_generic_payload_keeps_status() {
        let classified = classify(&http_error(503, "try later"));
        match classified {
            ApiError::Generic {
                status_code, body, ..
            } => {
                assert_eq!(status_code, 503);
                assert_eq!(body, "try later");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_generic_body_json_is_pretty_printed() {
        let classified = classify(&http_error(500, r#"{"error":"boom"}"#));
        let ApiError::Generic { body, .. } = classified else {
            panic!("expected generic");
        };
        assert_eq!(body, "{\n  \"error\": \"boom\"\n}");
    }

    #[test]
    fn test_generic_body_is_truncated() {
        let body = "x".repeat(250);
        let ApiError::Generic { body, .. } = classify(&http_error(502, &body)) else {
            panic!("expected generic");
        };
        assert!(body.starts_with(&"x".repeat(200)));
        assert!(body.ends_with("... (truncated 50 bytes)"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // 'é' is two bytes; byte 200 falls in the middle of one.
        let body = format!("a{}", "é".repeat(150));
        let truncated = truncate_body(&body, 200);
        assert!(truncated.contains("... (truncated"));
        assert!(truncated.starts_with('a'));
    }

    #[test]
    fn test_short_body_untouched() {
        assert_eq!(format_body("not json"), "not json");
        assert_eq!(format_body("   "), "");
    }

    #[test]
    fn test_cancellation_markers() {
        let cancelled = anyhow::Error::new(Cancelled).context("fetching page 2");
        assert_eq!(classify(&cancelled), ApiError::Cancelled);

        let deadline = anyhow::Error::new(DeadlineElapsed);
        assert_eq!(classify(&deadline), ApiError::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_tokio_timeout_is_deadline() {
        let elapsed = tokio::time::timeout(Duration::from_millis(1), std::future::pending::<()>())
            .await
            .unwrap_err();
        let err = anyhow::Error::new(elapsed);
        assert_eq!(classify(&err), ApiError::DeadlineExceeded);
    }

    #[test]
    fn test_api_error_passes_through() {
        let err = anyhow::Error::new(ApiError::Cancelled);
        assert_eq!(classify(&err), ApiError::Cancelled);
    }

    #[test]
    fn test_unknown_fallback() {
        let err = anyhow::Error::new(std::io::Error::other("connection reset"))
            .context("sending request");

        let classified = classify(&err);
        assert_eq!(
            classified,
            ApiError::unknown("sending request: connection reset")
        );
        assert_eq!(classified.status_code(), None);
        assert!(!classified.is_retryable());
    }
}

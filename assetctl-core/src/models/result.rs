//! Fetch results and response metadata.
//!
//! - [`Page`] - What a single remote call returns
//! - [`FetchResult`] - What a whole paged/batched fetch returns
//! - [`ResponseMeta`] - Request metadata attached to both
//! - [`DayEntry`] - One entry of a calendar-day series

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ApiError;

// ============================================================================
// Response Meta
// ============================================================================

/// Metadata describing the request(s) behind a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// HTTP method of the last request.
    pub method: String,
    /// URL of the last request.
    pub url: String,
    /// HTTP status code of the last successful response.
    pub status_code: u16,
    /// Wall-clock time across the entire fetch.
    #[serde(rename = "latencyMs", serialize_with = "serialize_millis")]
    pub latency: Duration,
    /// Remote attempts executed.
    pub attempts: u32,
    /// Pages or batches successfully processed.
    pub page_count: u32,
}

impl ResponseMeta {
    /// Creates metadata for a single request.
    pub fn new(method: impl Into<String>, url: impl Into<String>, status_code: u16) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            status_code,
            ..Self::default()
        }
    }

    /// Sets the latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// Page
// ============================================================================

/// One page or batch returned by a single remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in server order.
    pub items: Vec<T>,
    /// Metadata of this call.
    pub meta: ResponseMeta,
    /// Continuation token for the next page, if the server returned one.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page without a continuation token.
    pub fn new(items: Vec<T>, meta: ResponseMeta) -> Self {
        Self {
            items,
            meta,
            next_cursor: None,
        }
    }

    /// Sets the continuation token.
    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }
}

// ============================================================================
// Fetch Result
// ============================================================================

/// The outcome of a paged or batched fetch.
///
/// `partial_error` is only set when some pages succeeded before a later
/// failure. A failure on the very first page is reported as a hard error
/// instead and never produces a `FetchResult`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult<T> {
    /// Accumulated items (empty when they were streamed instead).
    pub items: Vec<T>,
    /// Metadata finalized for the whole fetch.
    pub meta: ResponseMeta,
    /// Failure that cut the fetch short, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_error: Option<ApiError>,
}

impl<T> FetchResult<T> {
    /// Returns true if the fetch ended early with a recorded failure.
    pub fn is_partial(&self) -> bool {
        self.partial_error.is_some()
    }

    /// Number of accumulated items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no items were accumulated.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Day Entry
// ============================================================================

/// A snapshot "as of" one calendar day.
///
/// Days without meaningful data are kept with `exists == false` so a series
/// always has one entry per day in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry<T> {
    /// The instant the snapshot was requested at.
    pub at: DateTime<Utc>,
    /// Whether the resource existed at that instant.
    pub exists: bool,
    /// The snapshot, when it exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> DayEntry<T> {
    /// Creates an entry from an optional snapshot.
    pub fn new(at: DateTime<Utc>, data: Option<T>) -> Self {
        Self {
            at,
            exists: data.is_some(),
            data,
        }
    }
}

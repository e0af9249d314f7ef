//! Data-fetching operations behind the CLI commands.
//!
//! Each operation pairs one paging strategy with one [`AssetSource`] method:
//!
//! | Operation | Strategy | Source call |
//! |-----------|----------|-------------|
//! | [`search`] | cursor pagination | [`AssetSource::search`] |
//! | [`view`] | fixed-size batches | [`AssetSource::get_assets`] |
//! | [`history`] | calendar days | [`AssetSource::host_at`] |
//!
//! Queues and the context travel with the [`PagedFetch`] the caller builds.

use assetctl_core::{ApiError, DayEntry, FetchResult, ResourceKind};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::paging::{DayRange, PagedFetch};
use crate::source::AssetSource;

/// Default number of hits per search page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// ============================================================================
// Search
// ============================================================================

/// A search query and its paging limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Query in the platform's search language.
    pub query: String,
    /// Hits per page.
    pub page_size: u32,
    /// Stop after this many pages, if set.
    pub max_pages: Option<u32>,
}

impl SearchRequest {
    /// Creates an unbounded request with the default page size.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
        }
    }

    /// Sets the page size (at least one).
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Limits the number of pages.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }
}

/// Runs a search, following continuation tokens.
pub async fn search(
    fetch: &PagedFetch<'_, Value>,
    source: &dyn AssetSource,
    request: &SearchRequest,
) -> Result<FetchResult<Value>, ApiError> {
    debug!(query = %request.query, page_size = request.page_size, "Starting search");
    fetch
        .fetch_cursor_pages(request.max_pages, |cursor| {
            source.search(&request.query, request.page_size, cursor)
        })
        .await
}

// ============================================================================
// View
// ============================================================================

/// Looks up assets by identifier in batches of the kind's ceiling.
pub async fn view(
    fetch: &PagedFetch<'_, Value>,
    source: &dyn AssetSource,
    kind: ResourceKind,
    ids: &[String],
    at: Option<DateTime<Utc>>,
) -> Result<FetchResult<Value>, ApiError> {
    debug!(%kind, ids = ids.len(), ceiling = kind.batch_ceiling(), "Starting lookup");
    fetch
        .fetch_batches(ids, kind.batch_ceiling(), |batch| {
            source.get_assets(kind, batch, at)
        })
        .await
}

// ============================================================================
// History
// ============================================================================

/// Fetches one snapshot of `host` per day of `range`.
pub async fn history(
    fetch: &PagedFetch<'_, DayEntry<Value>>,
    source: &dyn AssetSource,
    host: &str,
    range: DayRange,
) -> Result<FetchResult<DayEntry<Value>>, ApiError> {
    debug!(host, days = range.len(), "Starting history");
    fetch
        .fetch_days(range, |at| source.host_at(host, at))
        .await
}

// ============================================================================
// Tests
// ============================================================================

//! Cursor pagination.
//!
//! Each page returns an opaque continuation token; an absent or empty token
//! ends the loop.

use std::future::Future;

use assetctl_core::{ApiError, FetchResult, Page};
use tracing::instrument;

use super::PagedFetch;

/// Normalizes a continuation token: empty tokens count as absent.
pub fn next_cursor(token: Option<&str>) -> Option<String> {
    token
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
struct CursorState {
    cursor: Option<String>,
    page: u32,
}

impl<T> PagedFetch<'_, T> {
    /// Follows continuation tokens until the server stops returning one.
    ///
    /// `max_pages` stops the loop cleanly after that many pages; the result
    /// is then complete, not partial.
    #[instrument(skip(self, call), fields(label = %self.label))]
    pub async fn fetch_cursor_pages<F, Fut>(
        &self,
        max_pages: Option<u32>,
        mut call: F,
    ) -> Result<FetchResult<T>, ApiError>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = anyhow::Result<Page<T>>>,
    {
        let initial = CursorState {
            cursor: None,
            page: 1,
        };

        self.run(
            initial,
            |state| call(state.cursor),
            |state, page| {
                if max_pages.is_some_and(|max| state.page >= max) {
                    return None;
                }
                next_cursor(page.next_cursor.as_deref()).map(|cursor| CursorState {
                    cursor: Some(cursor),
                    page: state.page + 1,
                })
            },
        )
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FetchContext;
    use crate::retry::RetryExecutor;
    use assetctl_core::ResponseMeta;
    use std::sync::{Arc, Mutex};

    fn page(items: Vec<&'static str>, cursor: &str) -> Page<&'static str> {
        Page::new(items, ResponseMeta::new("POST", "https://api.test/search", 200))
            .with_cursor(cursor)
    }

    #[test]
    fn test_next_cursor() {
        assert_eq!(next_cursor(Some("abc")), Some("abc".to_string()));
        assert_eq!(next_cursor(Some("")), None);
        assert_eq!(next_cursor(None), None);
    }

    #[tokio::test]
    async fn test_follows_tokens_until_empty() {
        let ctx = FetchContext::new();
        let executor = RetryExecutor::default();
        let fetch = PagedFetch::new(&ctx, &executor);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        let result = fetch
            .fetch_cursor_pages(None, |cursor| {
                log.lock().unwrap().push(cursor.clone());
                async move {
                    Ok(match cursor.as_deref() {
                        None => page(vec!["a", "b"], "c1"),
                        Some("c1") => page(vec!["c"], "c2"),
                        _ => page(vec!["d"], ""),
                    })
                }
            })
            .await
            .unwrap();

        assert_eq!(result.items, vec!["a", "b", "c", "d"]);
        assert_eq!(result.meta.page_count, 3);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_max_pages_stops_cleanly() {
        let ctx = FetchContext::new();
        let executor = RetryExecutor::default();
        let fetch = PagedFetch::new(&ctx, &executor);

        let result = fetch
            .fetch_cursor_pages(Some(2), |_| async { Ok(page(vec!["x"], "more")) })
            .await
            .unwrap();

        assert_eq!(result.items, vec!["x", "x"]);
        assert_eq!(result.meta.page_count, 2);
        assert!(!result.is_partial());
    }
}

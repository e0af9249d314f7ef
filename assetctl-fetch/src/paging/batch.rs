//! Fixed-size batching of a known identifier list.

use std::future::Future;

use assetctl_core::{ApiError, FetchResult, Page, ResponseMeta};
use tracing::{debug, instrument};

use super::PagedFetch;

/// Splits `items` into contiguous chunks of at most `size` elements.
///
/// A `size` of zero is treated as one.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

impl<T> PagedFetch<'_, T> {
    /// Fetches `ids` in batches of at most `ceiling`, strictly left to right.
    ///
    /// An empty identifier list succeeds without any remote call.
    #[instrument(skip(self, ids, call), fields(label = %self.label, ids = ids.len()))]
    pub async fn fetch_batches<I, F, Fut>(
        &self,
        ids: &[I],
        ceiling: usize,
        mut call: F,
    ) -> Result<FetchResult<T>, ApiError>
    where
        I: Clone,
        F: FnMut(Vec<I>) -> Fut,
        Fut: Future<Output = anyhow::Result<Page<T>>>,
    {
        if ids.is_empty() {
            debug!(label = %self.label, "No identifiers, nothing to fetch");
            return Ok(FetchResult {
                items: Vec::new(),
                meta: ResponseMeta::default(),
                partial_error: None,
            });
        }

        let batches = chunk(ids, ceiling);
        let count = batches.len();
        let label = self.label.clone();

        self.run_with(
            0usize,
            move |_, page, total| format!("Fetching {label} batch {page}/{count} ({total} items so far)"),
            |index| call(batches[index].clone()),
            |index, _| (index + 1 < count).then_some(index + 1),
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
    use std::sync::{Arc, Mutex};

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("id-{i}")).collect()
    }

    #[test]
    fn test_chunk_sizes() {
        let chunks = chunk(&ids(150), 100);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 50);
        assert_eq!(chunks[1][0], "id-100");
    }

    #[test]
    fn test_chunk_edge_cases() {
        assert!(chunk::<u8>(&[], 10).is_empty());
        assert_eq!(chunk(&[1, 2, 3], 0), vec![vec![1], vec![2], vec![3]]);
        assert_eq!(chunk(&[1, 2], 5), vec![vec![1, 2]]);
    }

    #[tokio::test]
    async fn test_batches_run_in_order() {
        let ctx = FetchContext::new();
        let executor = RetryExecutor::default();
        let fetch = PagedFetch::new(&ctx, &executor).with_label("host");
        let sizes = Arc::new(Mutex::new(Vec::new()));

        let log = sizes.clone();
        let result = fetch
            .fetch_batches(&ids(150), 100, |batch: Vec<String>| {
                log.lock().unwrap().push(batch.len());
                async move {
                    Ok(Page::new(
                        batch,
                        ResponseMeta::new("GET", "https://api.test/hosts", 200),
                    ))
                }
            })
            .await
            .unwrap();

        assert_eq!(*sizes.lock().unwrap(), vec![100, 50]);
        assert_eq!(result.items, ids(150));
        assert_eq!(result.meta.page_count, 2);
    }

    #[tokio::test]
    async fn test_empty_ids_make_no_call() {
        let ctx = FetchContext::new();
        let executor = RetryExecutor::default();
        let fetch = PagedFetch::<u8>::new(&ctx, &executor);
        let calls = Arc::new(Mutex::new(0u32));

        let counter = calls.clone();
        let result = fetch
            .fetch_batches::<String, _, _>(&[], 100, |_| {
                *counter.lock().unwrap() += 1;
                async { Ok(Page::new(Vec::new(), ResponseMeta::default())) }
            })
            .await
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(result.is_empty());
        assert_eq!(result.meta.page_count, 0);
        assert!(!result.is_partial());
    }
}

//! Paged and batched fetch loops.
//!
//! [`PagedFetch::run`] is the shared skeleton: it calls one page at a time
//! through the [`RetryExecutor`], accumulates (or streams) the items, and
//! decides what a failure means:
//!
//! - a failure before any page succeeded is a hard error;
//! - a failure after at least one page degrades to a partial result that
//!   keeps everything fetched so far.
//!
//! The strategies in the submodules only differ in how the next state is
//! derived:
//!
//! - [`cursor`] - server continuation tokens
//! - [`days`] - one snapshot per calendar day
//! - [`batch`] - fixed-size chunks of a known identifier list

pub mod batch;
pub mod cursor;
pub mod days;

use std::future::Future;
use std::time::Instant;

use assetctl_core::{ApiError, FetchResult, Page, ProgressEvent, ResponseMeta, Stage, StreamItem};
use tracing::{debug, info, warn};

use crate::context::FetchContext;
use crate::queue::{EventQueue, collect_or_emit, report};
use crate::retry::RetryExecutor;

pub use batch::chunk;
pub use cursor::next_cursor;
pub use days::DayRange;

// ============================================================================
// Paged Fetch
// ============================================================================

/// One paged fetch operation and the collaborators bound to it.
///
/// Queues are bound explicitly; an unbound queue makes the matching
/// progress or emit call a no-op.
pub struct PagedFetch<'a, T> {
    ctx: &'a FetchContext,
    executor: &'a RetryExecutor,
    progress: Option<&'a EventQueue<ProgressEvent>>,
    stream: Option<&'a EventQueue<StreamItem<T>>>,
    label: String,
}

impl<'a, T> PagedFetch<'a, T> {
    /// Creates a fetch with no queues bound.
    pub fn new(ctx: &'a FetchContext, executor: &'a RetryExecutor) -> Self {
        Self {
            ctx,
            executor,
            progress: None,
            stream: None,
            label: "page".to_string(),
        }
    }

    /// Binds (or unbinds) a progress queue.
    #[must_use]
    pub fn with_progress(mut self, progress: Option<&'a EventQueue<ProgressEvent>>) -> Self {
        self.progress = progress;
        self
    }

    /// Binds (or unbinds) a stream queue. Bound streams receive items
    /// instead of the result's `items`.
    #[must_use]
    pub fn with_stream(mut self, stream: Option<&'a EventQueue<StreamItem<T>>>) -> Self {
        self.stream = stream;
        self
    }

    /// Sets the noun used in progress messages.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the context this fetch runs under.
    pub fn context(&self) -> &'a FetchContext {
        self.ctx
    }

    /// Returns true if items are streamed rather than collected.
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Publishes a progress event on the bound progress queue, if any.
    pub async fn report(&self, stage: Stage, message: impl Into<String>) {
        report(self.progress, self.ctx, ProgressEvent::new(stage, message)).await;
    }

    /// Runs the loop with the default "<label> N" progress message.
    ///
    /// `call_page` performs one remote call for a state. `next_state`
    /// inspects a successful page and returns the state of the following
    /// one, or `None` to stop.
    pub async fn run<S, F, Fut, N>(
        &self,
        initial: S,
        call_page: F,
        next_state: N,
    ) -> Result<FetchResult<T>, ApiError>
    where
        S: Clone,
        F: FnMut(S) -> Fut,
        Fut: Future<Output = anyhow::Result<Page<T>>>,
        N: FnMut(&S, &Page<T>) -> Option<S>,
    {
        let label = self.label.clone();
        self.run_with(
            initial,
            move |_, page, total| format!("Fetching {label} {page} ({total} items so far)"),
            call_page,
            next_state,
        )
        .await
    }

    /// Runs the loop with a custom progress message.
    ///
    /// `describe` receives the state, the 1-based page number and the
    /// running item total.
    pub async fn run_with<S, D, F, Fut, N>(
        &self,
        initial: S,
        describe: D,
        mut call_page: F,
        mut next_state: N,
    ) -> Result<FetchResult<T>, ApiError>
    where
        S: Clone,
        D: Fn(&S, u32, usize) -> String,
        F: FnMut(S) -> Fut,
        Fut: Future<Output = anyhow::Result<Page<T>>>,
        N: FnMut(&S, &Page<T>) -> Option<S>,
    {
        let start = Instant::now();
        let mut state = initial;
        let mut pages: u32 = 0;
        let mut attempts: u32 = 0;
        let mut total: usize = 0;
        let mut items = Vec::new();
        let mut last_meta: Option<ResponseMeta> = None;
        let mut partial_error: Option<ApiError> = None;

        'pages: loop {
            if let Some(err) = self.ctx.err() {
                if pages == 0 && !self.is_streaming() {
                    debug!(label = %self.label, error = %err, "Cancelled before first page");
                    return Err(err);
                }
                warn!(label = %self.label, pages, error = %err, "Fetch interrupted, keeping partial result");
                partial_error = Some(err);
                break;
            }

            self.report(Stage::Fetch, describe(&state, pages + 1, total))
                .await;

            let attempted = self
                .executor
                .execute(self.ctx, || call_page(state.clone()))
                .await;
            attempts += attempted.attempts;

            let page = match attempted.outcome {
                Ok(page) => page,
                Err(err) => {
                    if pages == 0 {
                        debug!(label = %self.label, error = %err, "First page failed");
                        return Err(err);
                    }
                    warn!(
                        label = %self.label,
                        pages,
                        error = %err,
                        "Page failed after partial success, keeping fetched data"
                    );
                    report(
                        self.progress,
                        self.ctx,
                        ProgressEvent::error(
                            Stage::Fetch,
                            format!("{} {} failed: {err}", self.label, pages + 1),
                            err.clone(),
                        ),
                    )
                    .await;
                    partial_error = Some(err);
                    break;
                }
            };

            let next = next_state(&state, &page);
            let Page {
                items: page_items,
                meta,
                ..
            } = page;

            let count = page_items.len();
            debug!(label = %self.label, page = pages + 1, items = count, "Page fetched");

            last_meta = Some(meta);
            pages += 1;

            for item in page_items {
                if let Err(err) = collect_or_emit(self.stream, self.ctx, item, &mut items).await {
                    warn!(label = %self.label, error = %err, "Item stream interrupted");
                    partial_error = Some(err.into());
                    break 'pages;
                }
                total += 1;
            }

            match next {
                Some(next) => state = next,
                None => break,
            }
        }

        let mut meta = last_meta.unwrap_or_default();
        meta.latency = start.elapsed();
        meta.page_count = pages;
        meta.attempts = attempts;

        info!(
            label = %self.label,
            pages,
            attempts,
            items = total,
            latency_ms = u64::try_from(meta.latency.as_millis()).unwrap_or(u64::MAX),
            partial = partial_error.is_some(),
            "Fetch finished"
        );

        Ok(FetchResult {
            items,
            meta,
            partial_error,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

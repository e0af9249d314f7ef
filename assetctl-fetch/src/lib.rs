// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `assetctl` Fetch
//!
//! The resilient remote-fetch engine behind every `assetctl` command.
//!
//! A command hands the engine a closure performing one remote call. The
//! engine turns it into a cancellable sequence of attempts and pages:
//!
//! - [`classify`] - Reduces any failure to an [`ApiError`](assetctl_core::ApiError)
//! - [`retry::RetryExecutor`] - Bounded retries with backoff
//! - [`queue::EventQueue`] - Backpressure-safe progress/stream delivery
//! - [`paging::PagedFetch`] - Cursor, calendar-day and batch loops with
//!   partial-result handling
//! - [`context::FetchContext`] - Cancellation and deadline threaded through
//!   every layer
//!
//! ## Transport
//!
//! The engine never talks HTTP itself. [`host::http::PlatformClient`] is the
//! reqwest-backed [`AssetSource`] the CLI injects; tests inject their own.
//!
//! ## Example
//!
//! ```ignore
//! use assetctl_fetch::{FetchContext, PagedFetch, RetryExecutor, RetryPolicy};
//!
//! let ctx = FetchContext::new();
//! let executor = RetryExecutor::new(RetryPolicy::default().with_max_attempts(3));
//! let fetch = PagedFetch::new(&ctx, &executor).with_label("search");
//!
//! let result = fetch
//!     .fetch_cursor_pages(None, |cursor| client.search("services.port: 22", 100, cursor))
//!     .await?;
//! ```

pub mod classify;
pub mod context;
pub mod error;
pub mod host;
pub mod operations;
pub mod paging;
pub mod queue;
pub mod retry;
pub mod source;

// Re-export key types at crate root

// Errors
pub use classify::{classify, format_body};
pub use error::{
    Cancelled, DeadlineElapsed, HttpError, HttpErrorPayload, QueueError, StructuredErrorPayload,
    UnauthorizedPayload,
};

// Engine
pub use context::FetchContext;
pub use paging::{DayRange, PagedFetch, chunk};
pub use queue::{EventQueue, EventReceiver};
pub use retry::{Attempted, BackoffKind, RetryExecutor, RetryPolicy, backoff_delay};

// Sources
pub use host::http::PlatformClient;
pub use operations::SearchRequest;
pub use source::AssetSource;

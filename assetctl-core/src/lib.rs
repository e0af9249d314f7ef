// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `assetctl` Core
//!
//! Core types and models shared by every `assetctl` crate.
//!
//! This crate has no I/O. It defines:
//!
//! - The categorized error taxonomy returned by the fetch engine
//! - Fetch results and their response metadata
//! - Progress and stream events carried by event queues
//! - Resource kinds and their batch ceilings
//!
//! ## Key Types
//!
//! ### Errors
//! - [`ApiError`] - Categorized remote failure (structured, auth, generic, ...)
//! - [`CoreError`] - Local validation failures
//!
//! ### Results
//! - [`FetchResult`] - Accumulated items plus metadata and an optional partial error
//! - [`ResponseMeta`] - Method, URL, status, latency, attempts and page count
//! - [`Page`] - One page or batch returned by a remote call
//! - [`DayEntry`] - One calendar-day snapshot
//!
//! ### Events
//! - [`ProgressEvent`] / [`Stage`] - Progress notifications
//! - [`StreamItem`] - Streamed items
//! - [`Terminal`] - Construction of the final `done` marker

pub mod error;
pub mod models;

// Re-export error types
pub use error::{ApiError, CoreError, FieldError, status_text};

// Re-export all model types
pub use models::{
    // Results
    DayEntry,
    FetchResult,
    Page,
    ResponseMeta,
    // Events
    ProgressEvent,
    Stage,
    StreamItem,
    Terminal,
    // Resources
    ResourceKind,
};

//! Domain models for `assetctl`.
//!
//! ## Submodules
//!
//! - [`result`] - Fetch results and response metadata
//! - [`events`] - Progress and stream events carried by event queues
//! - [`resource`] - Resource kinds and batch ceilings

mod events;
mod resource;
mod result;

// Re-export everything at the models level
pub use events::{ProgressEvent, Stage, StreamItem, Terminal};
pub use resource::ResourceKind;
pub use result::{DayEntry, FetchResult, Page, ResponseMeta};

//! Output formatting and queue consumers for the CLI.
//!
//! - [`JsonFormatter`] / [`TextFormatter`] - Render buffered results
//! - [`ProgressRenderer`] - Draws progress events on stderr
//! - [`StreamWriter`] - Writes streamed items to stdout as NDJSON

mod json;
mod progress;
mod stream;
mod text;

pub use json::JsonFormatter;
pub use progress::ProgressRenderer;
pub use stream::StreamWriter;
pub use text::TextFormatter;

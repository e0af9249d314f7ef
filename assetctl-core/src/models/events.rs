//! Events carried by event queues.
//!
//! Both event types end a queue with a terminal `done` marker, built through
//! the [`Terminal`] trait so a queue can emit it without knowing its payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ============================================================================
// Terminal
// ============================================================================

/// Events that can represent the final marker of a queue.
pub trait Terminal {
    /// Builds the terminal `done` event carrying the final error, if any.
    fn terminal(err: Option<ApiError>) -> Self;

    /// Returns true if this is the terminal marker.
    fn is_done(&self) -> bool;
}

// ============================================================================
// Stage
// ============================================================================

/// Stage of a command a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Building the request.
    Prepare,
    /// Talking to the platform.
    #[default]
    Fetch,
    /// Post-processing fetched data.
    Process,
    /// Writing output.
    Render,
}

impl Stage {
    /// Returns the display name for this stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Fetch => "fetch",
            Self::Process => "process",
            Self::Render => "render",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Progress Event
// ============================================================================

/// A progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Stage the event belongs to.
    pub stage: Stage,
    /// Human-readable message.
    pub message: String,
    /// True for the terminal marker.
    pub done: bool,
    /// Error attached to this event, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<ApiError>,
}

impl ProgressEvent {
    /// Creates a progress message.
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            done: false,
            err: None,
        }
    }

    /// Creates a non-terminal error notification.
    pub fn error(stage: Stage, message: impl Into<String>, err: ApiError) -> Self {
        Self {
            stage,
            message: message.into(),
            done: false,
            err: Some(err),
        }
    }
}

impl Terminal for ProgressEvent {
    fn terminal(err: Option<ApiError>) -> Self {
        Self {
            stage: Stage::Render,
            message: String::new(),
            done: true,
            err,
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

// ============================================================================
// Stream Item
// ============================================================================

/// An item streamed directly to a consumer instead of being buffered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamItem<T> {
    /// The item, absent on the terminal marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Final error, only on the terminal marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<ApiError>,
    /// True for the terminal marker.
    pub done: bool,
}

impl<T> StreamItem<T> {
    /// Wraps one data item.
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            err: None,
            done: false,
        }
    }
}

impl<T> Terminal for StreamItem<T> {
    fn terminal(err: Option<ApiError>) -> Self {
        Self {
            data: None,
            err,
            done: true,
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_markers() {
        let progress = ProgressEvent::terminal(Some(ApiError::Cancelled));
        assert!(progress.is_done());
        assert_eq!(progress.err, Some(ApiError::Cancelled));

        let item: StreamItem<u32> = StreamItem::terminal(None);
        assert!(item.is_done());
        assert!(item.data.is_none());

        assert!(!StreamItem::data(7).is_done());
        assert!(!ProgressEvent::new(Stage::Fetch, "page 1").is_done());
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&Stage::Prepare).unwrap();
        assert_eq!(json, "\"prepare\"");
        assert_eq!(Stage::Render.to_string(), "render");
    }
}

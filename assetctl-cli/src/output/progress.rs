//! Live progress line on stderr.

use std::io::Write;

use assetctl_core::{ApiError, ProgressEvent};
use assetctl_fetch::queue::channel;
use assetctl_fetch::{EventQueue, EventReceiver};
use tokio::task::JoinHandle;
use tracing::debug;

/// Clears the current terminal line.
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Consumes a progress queue on its own task and redraws one status line.
pub struct ProgressRenderer {
    queue: EventQueue<ProgressEvent>,
    task: JoinHandle<()>,
}

impl ProgressRenderer {
    /// Starts a renderer, or returns `None` when progress is not shown.
    ///
    /// Without a renderer no progress queue is bound at all.
    pub fn spawn(capacity: usize, enabled: bool) -> Option<Self> {
        if !enabled {
            return None;
        }
        let (queue, rx) = channel(capacity);
        let task = tokio::spawn(render(rx));
        Some(Self { queue, task })
    }

    /// The queue to bind to a fetch.
    pub fn queue(&self) -> &EventQueue<ProgressEvent> {
        &self.queue
    }

    /// Closes the queue and waits until the line is cleared.
    pub async fn finish(self, final_err: Option<ApiError>) {
        self.queue.close(final_err);
        if let Err(e) = self.task.await {
            debug!(error = %e, "Progress renderer ended abnormally");
        }
    }
}

async fn render(rx: EventReceiver<ProgressEvent>) {
    draw(rx, &mut std::io::stderr()).await;
}

/// Draws every event until the terminal event or until the queue closes.
///
/// The line is always left cleared, even when the terminal event was dropped
/// on a full queue.
pub async fn draw<W: Write>(mut rx: EventReceiver<ProgressEvent>, out: &mut W) {
    let mut cleared = false;
    while let Some(event) = rx.recv().await {
        // Write failures only lose progress output.
        let _ = write!(out, "{}", status_line(&event));
        let _ = out.flush();
        if event.done {
            cleared = true;
            break;
        }
    }
    if !cleared {
        let _ = write!(out, "{CLEAR_LINE}");
        let _ = out.flush();
    }
}

/// Terminal text for one event.
///
/// Errors get a line of their own; the terminal event only clears.
pub fn status_line(event: &ProgressEvent) -> String {
    if event.done {
        return CLEAR_LINE.to_string();
    }
    match &event.err {
        Some(err) => format!("{CLEAR_LINE}{}: {}: {err}\n", event.stage, event.message),
        None => format!("{CLEAR_LINE}{}: {}", event.stage, event.message),
    }
}

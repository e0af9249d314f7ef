//! NDJSON writer for streamed items.

use std::io::Write;

use anyhow::{Context, Result};
use assetctl_core::{ApiError, StreamItem};
use assetctl_fetch::queue::channel;
use assetctl_fetch::{EventQueue, EventReceiver};
use futures::StreamExt;
use serde::Serialize;
use tokio::task::JoinHandle;

/// Consumes a stream queue on its own task, writing one JSON line per item.
pub struct StreamWriter<T> {
    queue: EventQueue<StreamItem<T>>,
    task: JoinHandle<Result<usize>>,
}

impl<T> StreamWriter<T>
where
    T: Serialize + Send + 'static,
{
    /// Starts a writer on stdout.
    pub fn spawn(capacity: usize) -> Self {
        let (queue, rx) = channel(capacity);
        let task = tokio::spawn(async move {
            let mut stdout = std::io::stdout();
            write_ndjson(rx, &mut stdout).await
        });
        Self { queue, task }
    }

    /// The queue to bind to a fetch.
    pub fn queue(&self) -> &EventQueue<StreamItem<T>> {
        &self.queue
    }

    /// Closes the queue and returns how many items were written.
    pub async fn finish(self, final_err: Option<ApiError>) -> Result<usize> {
        self.queue.close(final_err);
        self.task.await.context("stream writer task failed")?
    }
}

/// Writes every data item of `rx` to `out` until the terminal marker or,
/// when the marker was dropped on a full queue, until the queue closes.
///
/// Dropping `rx` on a write error makes further publishes fail, which the
/// fetch loop turns into a partial result.
pub async fn write_ndjson<T, W>(rx: EventReceiver<StreamItem<T>>, out: &mut W) -> Result<usize>
where
    T: Serialize,
    W: Write,
{
    let mut written = 0;
    let mut items = Box::pin(rx.into_stream());

    while let Some(item) = items.next().await {
        if item.done {
            break;
        }
        if let Some(data) = &item.data {
            serde_json::to_writer(&mut *out, data)?;
            out.write_all(b"\n")?;
            out.flush()?;
            written += 1;
        }
    }

    Ok(written)
}

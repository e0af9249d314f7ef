//! Bounded single-producer, single-consumer event queue.
//!
//! The same primitive carries progress notifications and streamed items.
//! Producers wait for a free slot instead of dropping events, and give up
//! only when the queue is closed or the [`FetchContext`] is cancelled.
//!
//! Closing is idempotent. The first [`EventQueue::close`] tries to deliver a
//! terminal `done` event without blocking and then disconnects the sender so
//! the consumer drains what is buffered and terminates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use assetctl_core::{ApiError, ProgressEvent, StreamItem, Terminal};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::FetchContext;
use crate::error::QueueError;

/// Default queue capacity, used when configuration does not set one.
pub const DEFAULT_CAPACITY: usize = 1;

/// Creates a queue with the given capacity (at least one slot).
pub fn channel<T: Terminal>(capacity: usize) -> (EventQueue<T>, EventReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let queue = EventQueue {
        sender: Mutex::new(Some(tx)),
        close_once: AtomicBool::new(false),
        closed: CancellationToken::new(),
    };
    (queue, EventReceiver { rx })
}

// ============================================================================
// Event Queue (producer side)
// ============================================================================

/// Producer half of a bounded event queue.
#[derive(Debug)]
pub struct EventQueue<T> {
    sender: Mutex<Option<mpsc::Sender<T>>>,
    close_once: AtomicBool,
    closed: CancellationToken,
}

impl<T: Terminal> EventQueue<T> {
    /// Publishes an event, waiting for a free slot.
    ///
    /// Fails with [`QueueError::Closed`] if the queue is closed (or its
    /// consumer is gone) and with [`QueueError::Interrupted`] if `ctx` is
    /// cancelled first.
    pub async fn publish(&self, ctx: &FetchContext, event: T) -> Result<(), QueueError> {
        let sender = self.lock().clone().ok_or(QueueError::Closed)?;

        tokio::select! {
            biased;
            err = ctx.done() => Err(QueueError::Interrupted(err)),
            () = self.closed.cancelled() => Err(QueueError::Closed),
            sent = sender.send(event) => sent.map_err(|_| QueueError::Closed),
        }
    }

    /// Closes the queue. Only the first call has any effect.
    ///
    /// The terminal event is sent without blocking and is dropped if the
    /// queue is full at that moment.
    pub fn close(&self, final_err: Option<ApiError>) {
        if self
            .close_once
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let mut sender = self.lock();
        if let Some(tx) = sender.as_ref() {
            if tx.try_send(T::terminal(final_err)).is_err() {
                debug!("Terminal event dropped, queue full or consumer gone");
            }
        }
        *sender = None;
        drop(sender);

        self.closed.cancel();
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> MutexGuard<'_, Option<mpsc::Sender<T>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Event Receiver (consumer side)
// ============================================================================

/// Consumer half of a bounded event queue.
#[derive(Debug)]
pub struct EventReceiver<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> EventReceiver<T> {
    /// Receives the next event; `None` once the queue is closed and drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Collects every remaining event until the queue is closed.
    pub async fn drain(mut self) -> Vec<T> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }

    /// Converts the receiver into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures::stream::unfold(self.rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
    }
}

// ============================================================================
// Optional Bindings
// ============================================================================

/// Publishes a progress event if a progress queue is bound.
///
/// Delivery failures are logged and otherwise ignored: progress is advisory.
pub async fn report(
    progress: Option<&EventQueue<ProgressEvent>>,
    ctx: &FetchContext,
    event: ProgressEvent,
) {
    let Some(queue) = progress else {
        return;
    };
    if let Err(err) = queue.publish(ctx, event).await {
        debug!(error = %err, "Progress event not delivered");
    }
}

/// Emits `item` on the stream queue if one is bound, else appends it to `items`.
///
/// An emitted item is not also accumulated.
pub async fn collect_or_emit<T>(
    stream: Option<&EventQueue<StreamItem<T>>>,
    ctx: &FetchContext,
    item: T,
    items: &mut Vec<T>,
) -> Result<(), QueueError> {
    match stream {
        Some(queue) => queue.publish(ctx, StreamItem::data(item)).await,
        None => {
            items.push(item);
            Ok(())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assetctl_core::Stage;
    use futures::StreamExt;
    use std::time::Duration;

    const GENEROUS: Duration = Duration::from_secs(5);

    fn progress(n: usize) -> ProgressEvent {
        ProgressEvent::new(Stage::Fetch, format!("event {n}"))
    }

    #[tokio::test]
    async fn test_publish_and_receive_in_order() {
        let (queue, rx) = channel::<ProgressEvent>(4);
        let ctx = FetchContext::new();

        for n in 0..3 {
            queue.publish(&ctx, progress(n)).await.unwrap();
        }
        queue.close(None);

        let events = rx.drain().await;
        let messages: Vec<_> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["event 0", "event 1", "event 2", ""]);
        assert!(events.last().unwrap().done);
    }

    #[tokio::test]
    async fn test_backpressure_with_slow_consumer() {
        let (queue, mut rx) = channel::<ProgressEvent>(1);
        let ctx = FetchContext::new();

        let consumer = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(event) = rx.recv().await {
                tokio::time::sleep(Duration::from_millis(20)).await;
                seen.push(event);
            }
            seen
        });

        for n in 0..5 {
            tokio::time::timeout(GENEROUS, queue.publish(&ctx, progress(n)))
                .await
                .expect("publish should not deadlock")
                .unwrap();
        }
        queue.close(None);

        let seen = tokio::time::timeout(GENEROUS, consumer).await.unwrap().unwrap();
        let data: Vec<_> = seen.iter().filter(|e| !e.done).collect();
        assert_eq!(data.len(), 5);
        assert_eq!(data[4].message, "event 4");
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (queue, rx) = channel::<ProgressEvent>(4);

        queue.close(Some(ApiError::Cancelled));
        queue.close(None);
        queue.close(Some(ApiError::DeadlineExceeded));

        let events = rx.drain().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].done);
        assert_eq!(events[0].err, Some(ApiError::Cancelled));
    }

    #[tokio::test]
    async fn test_publish_after_close_fails() {
        let (queue, _rx) = channel::<ProgressEvent>(1);
        let ctx = FetchContext::new();

        queue.close(None);

        assert!(queue.is_closed());
        assert_eq!(
            queue.publish(&ctx, progress(0)).await,
            Err(QueueError::Closed)
        );
    }

    #[tokio::test]
    async fn test_terminal_dropped_when_full() {
        let (queue, rx) = channel::<ProgressEvent>(1);
        let ctx = FetchContext::new();

        queue.publish(&ctx, progress(0)).await.unwrap();
        queue.close(None);

        let events = rx.drain().await;
        assert_eq!(events.len(), 1);
        assert!(!events[0].done);
    }

    #[tokio::test]
    async fn test_cancellation_unblocks_full_queue() {
        let (queue, _rx) = channel::<ProgressEvent>(1);
        let ctx = FetchContext::new();

        queue.publish(&ctx, progress(0)).await.unwrap();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(GENEROUS, queue.publish(&ctx, progress(1)))
            .await
            .expect("cancellation should unblock publish");
        assert_eq!(result, Err(QueueError::Interrupted(ApiError::Cancelled)));
    }

    #[tokio::test]
    async fn test_dropped_consumer_reports_closed() {
        let (queue, rx) = channel::<ProgressEvent>(1);
        let ctx = FetchContext::new();
        drop(rx);

        assert_eq!(
            queue.publish(&ctx, progress(0)).await,
            Err(QueueError::Closed)
        );
    }

    #[tokio::test]
    async fn test_unbound_queue_is_noop() {
        let ctx = FetchContext::new();
        ctx.cancel();

        // Neither blocks nor fails, even with a cancelled context.
        report(None, &ctx, progress(0)).await;

        let mut items = Vec::new();
        collect_or_emit::<u32>(None, &ctx, 7, &mut items).await.unwrap();
        assert_eq!(items, vec![7]);
    }

    #[tokio::test]
    async fn test_bound_stream_emits_instead_of_collecting() {
        let (queue, rx) = channel::<StreamItem<u32>>(4);
        let ctx = FetchContext::new();
        let mut items = Vec::new();

        collect_or_emit(Some(&queue), &ctx, 1, &mut items).await.unwrap();
        collect_or_emit(Some(&queue), &ctx, 2, &mut items).await.unwrap();
        queue.close(None);

        assert!(items.is_empty());
        let streamed: Vec<_> = rx.into_stream().collect().await;
        assert_eq!(streamed.len(), 3);
        assert_eq!(streamed[0].data, Some(1));
        assert_eq!(streamed[1].data, Some(2));
        assert!(streamed[2].done);
    }
}

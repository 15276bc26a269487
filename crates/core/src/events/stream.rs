//! One-directional event channel from a run to a single observer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::types::RunEvent;

/// Append-only channel carrying [`RunEvent`]s to one observer.
///
/// Clones share the same channel; closing through any clone closes it for
/// all of them. Pushing after close, or after the observer went away, is a
/// no-op so a run keeps going when its client disconnects.
#[derive(Debug, Clone)]
pub struct EventStream {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    sender: Mutex<Option<mpsc::Sender<RunEvent>>>,
    delivered: AtomicU64,
}

impl EventStream {
    /// Create a stream and the receiving end handed to the transport.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RunEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stream = Self {
            inner: Arc::new(Inner {
                sender: Mutex::new(Some(tx)),
                delivered: AtomicU64::new(0),
            }),
        };
        (stream, rx)
    }

    /// A stream with no observer; every push is dropped.
    pub fn detached() -> Self {
        Self {
            inner: Arc::new(Inner {
                sender: Mutex::new(None),
                delivered: AtomicU64::new(0),
            }),
        }
    }

    /// Deliver an event in push order. Returns whether it reached the channel.
    pub async fn push(&self, event: RunEvent) -> bool {
        let sender = self
            .inner
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let Some(sender) = sender else {
            trace!(kind = event.kind.as_str(), "Event dropped, stream closed");
            return false;
        };

        match sender.send(event).await {
            Ok(()) => {
                self.inner.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                debug!("Event observer disconnected");
                false
            }
        }
    }

    /// End the channel. Idempotent; returns whether this call closed it.
    pub fn close(&self) -> bool {
        let closed = self
            .inner
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if closed {
            debug!(delivered = self.delivered(), "Event stream closed");
        }
        closed
    }

    pub fn is_closed(&self) -> bool {
        match self
            .inner
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(sender) => sender.is_closed(),
            None => true,
        }
    }

    /// Number of events that reached the channel.
    pub fn delivered(&self) -> u64 {
        self.inner.delivered.load(Ordering::Relaxed)
    }
}

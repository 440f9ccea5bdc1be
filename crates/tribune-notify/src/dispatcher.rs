use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use tribune_types::events::ForumEvent;

const EVENT_BUFFER: usize = 1024;

/// Fans domain events out to every in-process listener.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<ForumEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to domain events. Only events sent after this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<ForumEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Publish an event. With no listener attached the event is dropped.
    pub fn broadcast(&self, event: ForumEvent) {
        debug!("Dispatching event for thread {}", event.thread_id());
        let _ = self.inner.broadcast_tx.send(event);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

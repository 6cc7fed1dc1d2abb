//! Best-effort publication of display events.

use queue_core::QueueEvent;
use tokio::sync::broadcast;

/// Default capacity of the display event channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Error publishing an event.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("No display subscribers for {0}")]
    NoSubscribers(&'static str),

    #[error("Broadcast failed: {0}")]
    Failed(String),
}

/// Sink for display events.
pub trait Broadcaster: Send + Sync + 'static {
    /// Publish one event to every connected display.
    fn publish(&self, event: QueueEvent) -> Result<(), BroadcastError>;
}

/// Broadcaster backed by a tokio broadcast channel.
#[derive(Clone)]
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<QueueEvent>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, event: QueueEvent) -> Result<(), BroadcastError> {
        let name = event.name();
        self.tx
            .send(event)
            .map(|_| ())
            .map_err(|_| BroadcastError::NoSubscribers(name))
    }
}

/// Publish events in order.
///
/// Failures are logged at debug and dropped: a display that misses an update
/// never fails the operation that produced it.
pub fn publish_all<B: Broadcaster + ?Sized>(broadcaster: &B, events: Vec<QueueEvent>) {
    for event in events {
        let description = event.description();
        if let Err(e) = broadcaster.publish(event) {
            tracing::debug!("Discarded display event ({}): {}", description, e);
        }
    }
}

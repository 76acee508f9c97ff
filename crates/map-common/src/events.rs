//! Publish/subscribe channel for attribute data notifications.

use tokio::sync::broadcast;
use tracing::trace;

use crate::LayerId;

/// Default number of buffered events per subscriber.
const DEFAULT_CAPACITY: usize = 64;

/// Events emitted by the attribute loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeEvent {
    /// The layer's dataset was (re)populated.
    DataChanged { layer: LayerId, records: usize },
    /// Loading the layer's attribute table failed.
    LoadFailed { layer: LayerId, reason: String },
}

impl AttributeEvent {
    pub fn layer(&self) -> &LayerId {
        match self {
            AttributeEvent::DataChanged { layer, .. } | AttributeEvent::LoadFailed { layer, .. } => {
                layer
            }
        }
    }
}

/// Session-scoped notification channel.
///
/// Cloning yields another publisher for the same channel. Publishing never
/// waits on subscribers and succeeds when nobody is listening.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AttributeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AttributeEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning how many subscribers received it.
    pub fn publish(&self, event: AttributeEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                trace!(layer = %event.layer(), "No subscribers for attribute event");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

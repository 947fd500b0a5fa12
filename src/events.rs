//! In-process event bus.

use log::debug;
use tokio::sync::broadcast;

use crate::types::PubSubMessage;

/// Fan-out bus for [`PubSubMessage`]s.  Publishing never blocks and never
/// fails from the publisher's point of view.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PubSubMessage>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PubSubMessage> {
        self.tx.subscribe()
    }

    pub fn publish(&self, msg: PubSubMessage) {
        if let Err(e) = self.tx.send(msg) {
            debug!("No subscribers for {:?}", e.0.announcement);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

use tokio::sync::broadcast;

use crate::marketplace::{EventSink, MarketplaceEvent};

use super::messages::ServerMessage;

const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Fan-out point between the marketplace core and websocket clients.
///
/// Publishing never blocks and never fails from the caller's view: with no
/// subscribers the event is simply dropped, and a slow subscriber lags on
/// its own receiver without affecting the others.
pub struct EventHub {
    tx: broadcast::Sender<ServerMessage>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventHub {
    fn publish(&self, event: MarketplaceEvent) {
        let message = ServerMessage::new(event.name(), &event);
        let _ = self.tx.send(message);
    }
}

//! Connection capability used by the lobby: emit events, subscribe to server pushes and observe
//! the up/down status of the single socket.

/// In-process connection.
pub mod memory;
/// WebSocket connection with reconnection.
pub mod websocket;

use std::sync::Arc;

use tokio::sync::{
    broadcast::{self, error::RecvError, error::TryRecvError},
    watch,
};
use tracing::warn;

use crate::{
    dto::{event::ServerEvent, request::ClientEvent},
    error::ConnectionError,
};

pub use self::memory::MemoryConnection;
pub use self::websocket::WebSocketConnection;

const EVENT_HUB_CAPACITY: usize = 64;

/// Socket to the matchmaking server, injected into the lobby controller.
pub trait Connection {
    /// Current up/down status.
    fn is_connected(&self) -> bool;

    /// Watch the up/down status.
    fn status(&self) -> watch::Receiver<bool>;

    /// Send an event. Fails immediately when the socket is down; nothing is buffered.
    fn emit(&self, event: ClientEvent) -> Result<(), ConnectionError>;

    /// Register for server pushes. Dropping the subscription deregisters it.
    fn subscribe(&self) -> Subscription;
}

impl<T: Connection + ?Sized> Connection for Arc<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn status(&self) -> watch::Receiver<bool> {
        (**self).status()
    }

    fn emit(&self, event: ClientEvent) -> Result<(), ConnectionError> {
        (**self).emit(event)
    }

    fn subscribe(&self) -> Subscription {
        (**self).subscribe()
    }
}

/// Broadcast hub fanning decoded server events out to every subscription.
#[derive(Debug)]
pub struct EventHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(EVENT_HUB_CAPACITY)
    }
}

impl EventHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// Registered handler slot for server pushes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<ServerEvent>,
}

impl Subscription {
    /// Wait for the next event; `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "lobby subscription lagged; dropped server events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<ServerEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "lobby subscription lagged; dropped server events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::event::ErrorPayload;

    fn error_event(message: &str) -> ServerEvent {
        ServerEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }

    #[test]
    fn subscribers_only_see_later_events() {
        let hub = EventHub::default();
        hub.broadcast(error_event("before"));

        let mut subscription = hub.subscribe();
        assert_eq!(subscription.try_recv(), None);

        hub.broadcast(error_event("after"));
        assert_eq!(subscription.try_recv(), Some(error_event("after")));
    }

    #[test]
    fn lagging_subscription_skips_to_retained_events() {
        let hub = EventHub::new(2);
        let mut subscription = hub.subscribe();
        for message in ["a", "b", "c"] {
            hub.broadcast(error_event(message));
        }

        assert_eq!(subscription.try_recv(), Some(error_event("b")));
        assert_eq!(subscription.try_recv(), Some(error_event("c")));
        assert_eq!(subscription.try_recv(), None);
    }

    #[tokio::test]
    async fn recv_ends_when_hub_is_dropped() {
        let hub = EventHub::default();
        let mut subscription = hub.subscribe();
        drop(hub);
        assert_eq!(subscription.recv().await, None);
    }
}

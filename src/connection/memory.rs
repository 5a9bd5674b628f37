use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use crate::{
    connection::{Connection, EventHub, Subscription},
    dto::{
        event::ServerEvent,
        frame::{self, FrameError},
        request::ClientEvent,
    },
    error::ConnectionError,
};

/// In-process connection: records what the lobby emits and replays server events on demand.
///
/// Clones share the same socket, so a test can keep one handle while the controller owns another.
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    status: watch::Sender<bool>,
    hub: EventHub,
    emitted: Mutex<Vec<ClientEvent>>,
}

impl MemoryConnection {
    /// Create a connection with the given initial status.
    pub fn new(connected: bool) -> Self {
        let (status, _rx) = watch::channel(connected);
        Self {
            inner: Arc::new(Inner {
                status,
                hub: EventHub::default(),
                emitted: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Flip the up/down status.
    pub fn set_connected(&self, connected: bool) {
        self.inner.status.send_replace(connected);
    }

    /// Deliver a server event to every subscription.
    pub fn push(&self, event: ServerEvent) {
        self.inner.hub.broadcast(event);
    }

    /// Decode a raw text frame and deliver it.
    pub fn push_frame(&self, text: &str) -> Result<(), FrameError> {
        let event = frame::decode(text)?;
        self.push(event);
        Ok(())
    }

    /// Every event emitted so far, oldest first.
    pub fn emitted(&self) -> Vec<ClientEvent> {
        self.inner
            .emitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the emitted events.
    pub fn take_emitted(&self) -> Vec<ClientEvent> {
        std::mem::take(
            &mut *self
                .inner
                .emitted
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

impl Connection for MemoryConnection {
    fn is_connected(&self) -> bool {
        *self.inner.status.borrow()
    }

    fn status(&self) -> watch::Receiver<bool> {
        self.inner.status.subscribe()
    }

    fn emit(&self, event: ClientEvent) -> Result<(), ConnectionError> {
        if !self.is_connected() {
            return Err(ConnectionError::Disconnected);
        }

        let encoded = frame::encode(&event)?;
        debug!(frame = %encoded, "memory connection emit");
        self.inner
            .emitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        self.inner.hub.subscribe()
    }
}

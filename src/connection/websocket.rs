use std::{sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::sleep,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::{
    config::ReconnectPolicy,
    connection::{Connection, EventHub, Subscription},
    dto::{frame, request::ClientEvent},
    error::ConnectionError,
};

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a connected session ended.
enum SessionEnd {
    /// The connection handle was dropped or closed.
    OwnerGone,
    /// The server went away or the socket failed.
    Disconnected(String),
}

/// WebSocket connection to the matchmaking server, kept alive by a background supervisor.
///
/// The supervisor reconnects with exponential backoff and publishes the up/down status; events
/// emitted while the socket is down are refused rather than queued.
///
/// Frames are exchanged as plain WebSocket text messages (see [`crate::dto::frame`]); there is no
/// Socket.IO handshake or heartbeat.
pub struct WebSocketConnection {
    outbound: Option<mpsc::UnboundedSender<ClientEvent>>,
    hub: Arc<EventHub>,
    status: watch::Receiver<bool>,
    supervisor: Option<JoinHandle<()>>,
}

impl WebSocketConnection {
    /// Start connecting to `url` in the background.
    pub fn spawn(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        let url = url.into();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(false);
        let hub = Arc::new(EventHub::default());

        let supervisor = tokio::spawn(supervise(
            url,
            policy,
            outbound_rx,
            Arc::clone(&hub),
            status_tx,
        ));

        Self {
            outbound: Some(outbound_tx),
            hub,
            status: status_rx,
            supervisor: Some(supervisor),
        }
    }

    /// Wait until the socket is up, or give up after `limit`.
    pub async fn wait_connected(&self, limit: Duration) -> bool {
        let mut status = self.status.clone();
        tokio::time::timeout(limit, status.wait_for(|connected| *connected))
            .await
            .is_ok_and(|waited| waited.is_ok())
    }

    /// Close the socket gracefully and stop reconnecting.
    pub async fn close(mut self) {
        drop(self.outbound.take());
        if let Some(mut supervisor) = self.supervisor.take() {
            if tokio::time::timeout(CLOSE_TIMEOUT, &mut supervisor)
                .await
                .is_err()
            {
                warn!("websocket supervisor did not stop in time; aborting");
                supervisor.abort();
            }
        }
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        if let Some(supervisor) = self.supervisor.take() {
            supervisor.abort();
        }
    }
}

impl Connection for WebSocketConnection {
    fn is_connected(&self) -> bool {
        *self.status.borrow()
    }

    fn status(&self) -> watch::Receiver<bool> {
        self.status.clone()
    }

    fn emit(&self, event: ClientEvent) -> Result<(), ConnectionError> {
        if !self.is_connected() {
            return Err(ConnectionError::Disconnected);
        }
        let outbound = self.outbound.as_ref().ok_or(ConnectionError::Closed)?;
        outbound.send(event).map_err(|_| ConnectionError::Closed)
    }

    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }
}

/// Keep a socket open to `url`, reconnecting with exponential backoff until the owner goes away.
async fn supervise(
    url: String,
    policy: ReconnectPolicy,
    mut outbound: mpsc::UnboundedReceiver<ClientEvent>,
    hub: Arc<EventHub>,
    status: watch::Sender<bool>,
) {
    let mut delay = policy.initial_delay;

    loop {
        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                // Requests emitted before this session started were refused or belong to a
                // previous socket; drop anything still queued.
                let mut stale = 0usize;
                while outbound.try_recv().is_ok() {
                    stale += 1;
                }
                if stale > 0 {
                    warn!(stale, "dropping events queued before reconnection");
                }

                info!(%url, "connected to matchmaking server");
                status.send_replace(true);
                delay = policy.initial_delay;

                let end = run_session(socket, &mut outbound, &hub).await;
                status.send_replace(false);

                match end {
                    SessionEnd::OwnerGone => {
                        info!(%url, "websocket connection closed by owner");
                        return;
                    }
                    SessionEnd::Disconnected(reason) => {
                        warn!(%url, %reason, "matchmaking server connection lost; reconnecting");
                    }
                }
            }
            Err(err) => {
                warn!(%url, error = %err, "matchmaking server connection attempt failed");
            }
        }

        if outbound.is_closed() {
            return;
        }
        sleep(delay).await;
        delay = (delay * 2).min(policy.max_delay);
    }
}

/// Pump one connected socket: frame outbound events and fan inbound frames out to the hub.
async fn run_session(
    socket: Socket,
    outbound: &mut mpsc::UnboundedReceiver<ClientEvent>,
    hub: &EventHub,
) -> SessionEnd {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            next = outbound.recv() => {
                let Some(event) = next else {
                    let _ = sender.send(Message::Close(None)).await;
                    return SessionEnd::OwnerGone;
                };
                let text = match frame::encode(&event) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(event = event.name(), error = %err, "failed to encode event; dropping");
                        continue;
                    }
                };
                debug!(event = event.name(), "sending event");
                if let Err(err) = sender.send(Message::Text(text.into())).await {
                    return SessionEnd::Disconnected(err.to_string());
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => match frame::decode(text.as_str()) {
                        Ok(event) => {
                            debug!(event = ?event, "received server event");
                            hub.broadcast(event);
                        }
                        Err(err) => {
                            warn!(error = %err, payload = %text.as_str(), "ignoring undecodable frame");
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        return SessionEnd::Disconnected(format!("server closed the socket ({frame:?})"));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return SessionEnd::Disconnected(err.to_string()),
                    None => return SessionEnd::Disconnected("stream ended".into()),
                }
            }
        }
    }
}

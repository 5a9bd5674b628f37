//! Async driver for a [`LobbyController`]: serializes user commands, server pushes, connection
//! status changes and the search timer onto the single-owner controller.

use std::time::Duration;

use tokio::{
    sync::{mpsc, watch},
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{
    connection::Connection,
    dto::request::MatchRequest,
    services::{lobby::LobbyController, navigation::Navigator},
    state::LobbyView,
};

/// User actions forwarded to the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyCommand {
    /// Start a solo search.
    StartSearch(MatchRequest),
    /// Cancel the solo search.
    CancelSearch,
    /// Open a private room.
    CreateRoom(MatchRequest),
    /// Join a private room.
    JoinRoom {
        /// Identifier as typed.
        game_id: String,
        /// Match parameters.
        request: MatchRequest,
    },
    /// Abandon the room flow.
    LeaveRoom,
    /// Clear the shown message.
    DismissError,
    /// Reopen the lobby after a game.
    ReturnToLobby,
    /// Cache a subscription status string.
    SetSubscriptionStatus(String),
}

/// Cloneable sender for [`LobbyCommand`]s. The runner stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct LobbyHandle {
    tx: mpsc::UnboundedSender<LobbyCommand>,
}

impl LobbyHandle {
    /// Queue a command; returns `false` when the runner has stopped.
    pub fn send(&self, command: LobbyCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    /// Queue [`LobbyCommand::StartSearch`].
    pub fn start_search(&self, request: MatchRequest) -> bool {
        self.send(LobbyCommand::StartSearch(request))
    }

    /// Queue [`LobbyCommand::CancelSearch`].
    pub fn cancel_search(&self) -> bool {
        self.send(LobbyCommand::CancelSearch)
    }

    /// Queue [`LobbyCommand::CreateRoom`].
    pub fn create_room(&self, request: MatchRequest) -> bool {
        self.send(LobbyCommand::CreateRoom(request))
    }

    /// Queue [`LobbyCommand::JoinRoom`].
    pub fn join_room(&self, game_id: impl Into<String>, request: MatchRequest) -> bool {
        self.send(LobbyCommand::JoinRoom {
            game_id: game_id.into(),
            request,
        })
    }

    /// Queue [`LobbyCommand::LeaveRoom`].
    pub fn leave_room(&self) -> bool {
        self.send(LobbyCommand::LeaveRoom)
    }
}

/// Create the command channel feeding [`run`].
pub fn channel() -> (LobbyHandle, mpsc::UnboundedReceiver<LobbyCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LobbyHandle { tx }, rx)
}

/// Apply one user command to the controller.
///
/// Failures are already surfaced as the controller's notice; they are only logged here.
pub fn execute<C: Connection, N: Navigator>(
    controller: &mut LobbyController<C, N>,
    command: LobbyCommand,
) {
    let result = match command {
        LobbyCommand::StartSearch(request) => controller.start_solo_search(request),
        LobbyCommand::CancelSearch => {
            controller.cancel_solo_search();
            Ok(())
        }
        LobbyCommand::CreateRoom(request) => controller.create_private_room(request).map(|_| ()),
        LobbyCommand::JoinRoom { game_id, request } => {
            controller.join_private_room(&game_id, request)
        }
        LobbyCommand::LeaveRoom => {
            controller.leave_room();
            Ok(())
        }
        LobbyCommand::DismissError => {
            controller.dismiss_error();
            Ok(())
        }
        LobbyCommand::ReturnToLobby => {
            controller.return_to_lobby();
            Ok(())
        }
        LobbyCommand::SetSubscriptionStatus(status) => {
            controller.set_subscription_status(&status);
            Ok(())
        }
    };

    if let Err(err) = result {
        debug!(error = %err, "lobby command failed");
    }
}

/// Drive `controller` until every [`LobbyHandle`] is dropped or the connection's event hub goes
/// away, publishing a fresh [`LobbyView`] after each step. Returns the controller.
///
/// Server push handlers are registered when the runner starts and deregistered when it returns.
pub async fn run<C: Connection, N: Navigator>(
    mut controller: LobbyController<C, N>,
    mut commands: mpsc::UnboundedReceiver<LobbyCommand>,
    view: watch::Sender<LobbyView>,
    tick: Duration,
) -> LobbyController<C, N> {
    let mut events = controller.connection().subscribe();
    let mut status = controller.connection().status();
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut status_open = true;

    view.send_replace(controller.view());
    info!("lobby runner started");

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                let starts_search = matches!(command, LobbyCommand::StartSearch(_));
                execute(&mut controller, command);
                if starts_search {
                    // First tick one full period after the search begins.
                    ticker.reset();
                }
            }
            event = events.recv() => {
                let Some(event) = event else {
                    warn!("server event stream closed; stopping lobby runner");
                    break;
                };
                controller.handle_event(event);
            }
            changed = status.changed(), if status_open => {
                if changed.is_err() {
                    status_open = false;
                    continue;
                }
                let connected = *status.borrow_and_update();
                controller.handle_connection_change(connected);
            }
            _ = ticker.tick(), if controller.search().is_searching => {
                controller.tick();
            }
        }

        view.send_replace(controller.view());
    }

    info!("lobby runner stopped");
    controller
}

//! Battleground lobby binary: connects to the matchmaking server, runs one lobby action and prints
//! the resulting game session.

use std::time::Duration;

use anyhow::{Context, bail};
use battleground_lobby::{
    config::LobbyConfig,
    connection::WebSocketConnection,
    dto::request::{Difficulty, MatchRequest},
    services::{
        lobby::LobbyController,
        runner::{self, LobbyHandle},
    },
    state::{
        GameSessionHandoff, LobbyView,
        state_machine::{LobbyPhase, UiState},
    },
};
use clap::{Args, Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "battleground-lobby", version, about = "1v1 SQL battleground lobby client")]
struct Cli {
    /// Matchmaking server WebSocket URL (defaults to the configured one).
    #[arg(long, env = "BATTLEGROUND_SERVER_URL")]
    server: Option<String>,
    #[command(flatten)]
    player: PlayerArgs,
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Args)]
struct PlayerArgs {
    #[arg(long)]
    subject: String,
    #[arg(long, default_value_t = Difficulty::Easy)]
    difficulty: Difficulty,
    #[arg(long, default_value = "")]
    user_id: String,
    #[arg(long, default_value = "Player")]
    player_name: String,
    /// Battle length in seconds; defaults to the challenge's configured length.
    #[arg(long)]
    duration: Option<u64>,
    #[arg(long, default_value = "Bullet Surge")]
    challenge: String,
    /// Cached subscription status used to gate solo search.
    #[arg(long)]
    subscription: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Find a random opponent.
    Search,
    /// Open a private room and wait for a second player.
    Create,
    /// Join a private room by its identifier.
    Join { game_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = LobbyConfig::load();
    let server_url = cli.server.unwrap_or_else(|| config.server_url.clone());

    let request = MatchRequest {
        subject: cli.player.subject,
        difficulty: cli.player.difficulty,
        user_id: cli.player.user_id,
        player_name: cli.player.player_name,
        duration_seconds: cli
            .player
            .duration
            .or_else(|| config.challenge_duration(&cli.player.challenge)),
        challenge_type_label: cli.player.challenge,
    };

    let connection = WebSocketConnection::spawn(server_url.clone(), config.reconnect.clone());
    if !connection.wait_connected(CONNECT_TIMEOUT).await {
        bail!("could not reach matchmaking server at {server_url}");
    }

    let (handoff_tx, mut handoffs) = mpsc::unbounded_channel();
    let mut controller = LobbyController::new(connection, handoff_tx, config.room_ids.clone());
    if let Some(status) = cli.player.subscription.as_deref() {
        controller.set_subscription_status(status);
    }

    let (view_tx, mut view) = watch::channel(controller.view());
    let (handle, commands) = runner::channel();
    let lobby = tokio::spawn(runner::run(controller, commands, view_tx, config.search_tick));

    match cli.action {
        Action::Search => handle.start_search(request),
        Action::Create => handle.create_room(request),
        Action::Join { game_id } => handle.join_room(game_id, request),
    };

    let outcome = wait_for_game(&handle, &mut view, &mut handoffs, shutdown_signal()).await;

    drop(handle);
    let controller = lobby.await.context("lobby runner panicked")?;
    let (connection, _navigator) = controller.into_parts();
    connection.close().await;

    if let Some(handoff) = outcome? {
        println!(
            "{}",
            serde_json::to_string_pretty(&handoff).context("serializing game session")?
        );
    }
    Ok(())
}

/// Follow the lobby until a game session arrives, an error is surfaced, or `shutdown` resolves.
async fn wait_for_game(
    handle: &LobbyHandle,
    view: &mut watch::Receiver<LobbyView>,
    handoffs: &mut mpsc::UnboundedReceiver<GameSessionHandoff>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<Option<GameSessionHandoff>> {
    let mut announced_room: Option<String> = None;
    let mut last_ui = UiState::Idle;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            handoff = handoffs.recv() => {
                return handoff.map(Some).context("lobby stopped before a game started");
            }
            changed = view.changed() => {
                if changed.is_err() {
                    bail!("lobby stopped before a game started");
                }
                let current = view.borrow_and_update().clone();

                if let Some(notice) = &current.notice {
                    bail!("{}", notice.message());
                }
                if current.ui != last_ui {
                    info!(state = current.ui.as_str(), "lobby state changed");
                    last_ui = current.ui;
                }
                let elapsed = current.search.elapsed_seconds;
                if current.search.is_searching && elapsed > 0 && elapsed % 10 == 0 {
                    info!(elapsed = %current.search.elapsed_label(), "still searching");
                }
                let waiting_room = current
                    .room
                    .as_ref()
                    .filter(|room| room.is_host && current.phase == LobbyPhase::WaitingForOpponent);
                if let Some(room) = waiting_room
                    && announced_room.as_deref() != Some(room.game_id.as_str())
                {
                    info!(game_id = %room.game_id, "{}", room.share_text());
                    announced_room = Some(room.game_id.clone());
                }
            }
            () = &mut shutdown => {
                warn!("interrupted; cancelling");
                handle.cancel_search();
                handle.leave_room();
                return Ok(None);
            }
        }
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use battleground_lobby::{
        config::RoomIdPolicy, connection::MemoryConnection, error::LobbyNotice,
        services::runner::LobbyCommand,
    };
    use tokio::sync::oneshot;

    use super::*;

    fn idle_view() -> LobbyView {
        let navigator: Vec<GameSessionHandoff> = Vec::new();
        LobbyController::new(MemoryConnection::new(true), navigator, RoomIdPolicy::default()).view()
    }

    #[tokio::test]
    async fn interrupt_after_view_updates_cancels_the_lobby() {
        let (handle, mut commands) = runner::channel();
        let (view_tx, mut view) = watch::channel(idle_view());
        let (_handoff_tx, mut handoffs) = mpsc::unbounded_channel();
        let (interrupt_tx, interrupt_rx) = oneshot::channel::<()>();

        let updates = tokio::spawn(async move {
            for elapsed in 1..=5 {
                view_tx.send_modify(|current| current.search.elapsed_seconds = elapsed);
                tokio::task::yield_now().await;
            }
            let _ = interrupt_tx.send(());
            view_tx
        });

        let outcome = wait_for_game(&handle, &mut view, &mut handoffs, async {
            let _ = interrupt_rx.await;
        })
        .await
        .unwrap();
        let _view_tx = updates.await.unwrap();

        assert!(outcome.is_none());
        assert_eq!(commands.recv().await, Some(LobbyCommand::CancelSearch));
        assert_eq!(commands.recv().await, Some(LobbyCommand::LeaveRoom));
    }

    #[tokio::test]
    async fn surfaced_notice_ends_the_wait() {
        let (handle, _commands) = runner::channel();
        let (view_tx, mut view) = watch::channel(idle_view());
        let (_handoff_tx, mut handoffs) = mpsc::unbounded_channel();

        let mut rejected = idle_view();
        rejected.notice = Some(LobbyNotice::Connectivity("socket closed".into()));
        view_tx.send_replace(rejected);

        let err = wait_for_game(&handle, &mut view, &mut handoffs, std::future::pending())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Connection problem: socket closed");
    }
}

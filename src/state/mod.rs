/// Session handed to the game screen.
pub mod handoff;
/// Lobby phases and their transitions.
pub mod state_machine;

use crate::{
    dto::request::{Difficulty, MatchRequest},
    error::LobbyNotice,
    state::state_machine::{LobbyPhase, UiState},
};

pub use self::handoff::{GameSessionHandoff, HandoffDefaults};
pub use self::state_machine::{InvalidTransition, LobbyEvent, LobbyStateMachine, Snapshot};

/// Progress of a solo search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchState {
    /// A solo search is running.
    pub is_searching: bool,
    /// Whole seconds since the search started.
    pub elapsed_seconds: u64,
}

impl SearchState {
    /// Begin a new search with a fresh timer.
    pub fn start(&mut self) {
        self.is_searching = true;
        self.elapsed_seconds = 0;
    }

    /// Stop searching. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.is_searching = false;
        self.elapsed_seconds = 0;
    }

    /// Advance the timer by one second while searching.
    pub fn tick(&mut self) {
        if self.is_searching {
            self.elapsed_seconds += 1;
        }
    }

    /// Elapsed search time as `mm:ss`.
    pub fn elapsed_label(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.elapsed_seconds / 60,
            self.elapsed_seconds % 60
        )
    }
}

/// Progress of a private room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoomStatus {
    /// No room flow.
    #[default]
    Idle,
    /// Creation requested, awaiting acknowledgement.
    Creating,
    /// Room open, awaiting an opponent.
    Waiting,
    /// Join requested, awaiting the game start.
    Joining,
    /// Game starting.
    Starting,
}

/// Private room tracked by the lobby between the create/join request and the handoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomState {
    /// Identifier to display; replaced by the server's value once acknowledged.
    pub game_id: String,
    /// This client opened the room.
    pub is_host: bool,
    /// Progress of the room flow.
    pub status: RoomStatus,
    /// Subject requested for the room.
    pub subject: String,
    /// Difficulty requested for the room.
    pub difficulty: Difficulty,
    /// Requested battle length.
    pub duration_seconds: Option<u64>,
    /// Name of the local player.
    pub player_name: String,
}

impl RoomState {
    /// Room opened by this client.
    pub fn hosting(game_id: String, request: &MatchRequest) -> Self {
        Self::new(game_id, true, RoomStatus::Creating, request)
    }

    /// Room this client asked to join.
    pub fn joining(game_id: String, request: &MatchRequest) -> Self {
        Self::new(game_id, false, RoomStatus::Joining, request)
    }

    fn new(game_id: String, is_host: bool, status: RoomStatus, request: &MatchRequest) -> Self {
        Self {
            game_id,
            is_host,
            status,
            subject: request.subject.clone(),
            difficulty: request.difficulty,
            duration_seconds: request.duration_seconds,
            player_name: request.player_name.clone(),
        }
    }

    /// Invitation text for sharing the room out of band.
    pub fn share_text(&self) -> String {
        format!(
            "Join my {} battle ({}) with room ID {}",
            self.subject, self.difficulty, self.game_id
        )
    }
}

/// Everything a lobby screen needs to render, published after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyView {
    /// Current phase.
    pub phase: LobbyPhase,
    /// Phase as rendered.
    pub ui: UiState,
    /// Number of transitions applied so far.
    pub version: usize,
    /// Solo search progress.
    pub search: SearchState,
    /// Private room in progress.
    pub room: Option<RoomState>,
    /// Raw content of the join form.
    pub join_form: Option<String>,
    /// Message shown next to the last action.
    pub notice: Option<LobbyNotice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_timer_only_runs_while_searching() {
        let mut search = SearchState::default();
        search.tick();
        assert_eq!(search.elapsed_seconds, 0);

        search.start();
        for _ in 0..75 {
            search.tick();
        }
        assert_eq!(search.elapsed_label(), "01:15");

        search.stop();
        search.stop();
        assert!(!search.is_searching);
        assert_eq!(search.elapsed_seconds, 0);
    }

    #[test]
    fn share_text_mentions_room_id() {
        let request = MatchRequest {
            subject: "sql".into(),
            difficulty: Difficulty::Advanced,
            user_id: "u1".into(),
            player_name: "Alex".into(),
            duration_seconds: None,
            challenge_type_label: "Bullet Surge".into(),
        };
        let room = RoomState::hosting("SQLAB12CD".into(), &request);
        assert!(room.is_host);
        assert_eq!(room.status, RoomStatus::Creating);
        assert_eq!(
            room.share_text(),
            "Join my sql battle (advanced) with room ID SQLAB12CD"
        );
    }
}

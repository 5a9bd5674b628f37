use thiserror::Error;

/// Phases of the lobby, from the client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobbyPhase {
    /// Nothing in flight; every action is available.
    Idle,
    /// A solo search has been sent and no match has arrived yet.
    Searching,
    /// A private room has been requested but not acknowledged.
    CreatingRoom,
    /// The room exists and the host waits for a second player.
    WaitingForOpponent,
    /// A join request for a private room is in flight.
    JoiningRoom,
    /// A game session was received and is being handed off.
    Starting,
    /// The handoff was delivered; the game screen owns the session.
    InGame,
}

/// Coarse lobby status for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    /// `idle`
    Idle,
    /// `searching`
    Searching,
    /// `waiting`: any private room flow.
    Waiting,
    /// `starting`
    Starting,
    /// `navigating-to-game`
    NavigatingToGame,
}

impl UiState {
    /// Label used by status lines and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::Waiting => "waiting",
            Self::Starting => "starting",
            Self::NavigatingToGame => "navigating-to-game",
        }
    }
}

impl From<LobbyPhase> for UiState {
    fn from(phase: LobbyPhase) -> Self {
        match phase {
            LobbyPhase::Idle => Self::Idle,
            LobbyPhase::Searching => Self::Searching,
            LobbyPhase::CreatingRoom | LobbyPhase::WaitingForOpponent | LobbyPhase::JoiningRoom => {
                Self::Waiting
            }
            LobbyPhase::Starting => Self::Starting,
            LobbyPhase::InGame => Self::NavigatingToGame,
        }
    }
}

/// Events that can be applied to the lobby state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyEvent {
    /// The user started a solo search.
    SearchRequested,
    /// The user cancelled the solo search.
    SearchCancelled,
    /// The user asked for a private room.
    RoomRequested,
    /// The server acknowledged the private room.
    RoomCreated,
    /// The user asked to join a private room.
    JoinRequested,
    /// The user abandoned the room flow.
    RoomLeft,
    /// The server pushed a game session (match found or game start).
    SessionStarted,
    /// The server rejected the current attempt.
    Rejected,
    /// The handoff reached the game screen.
    Navigated,
    /// The user came back from a finished game.
    ReturnedToLobby,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: LobbyPhase,
    /// The event that cannot be applied from this phase.
    pub event: LobbyEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: LobbyPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// State machine for the matchmaking and private room flows.
#[derive(Debug, Clone)]
pub struct LobbyStateMachine {
    phase: LobbyPhase,
    version: usize,
}

impl Default for LobbyStateMachine {
    fn default() -> Self {
        Self {
            phase: LobbyPhase::Idle,
            version: 0,
        }
    }
}

impl LobbyStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> LobbyPhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Whether `event` is accepted from the current phase.
    pub fn can_apply(&self, event: LobbyEvent) -> bool {
        self.compute_transition(event).is_ok()
    }

    /// Apply an event, returning the new phase.
    pub fn apply(&mut self, event: LobbyEvent) -> Result<LobbyPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: LobbyEvent) -> Result<LobbyPhase, InvalidTransition> {
        use LobbyEvent as E;
        use LobbyPhase as P;

        let next = match (self.phase, event) {
            (P::Idle, E::SearchRequested) => P::Searching,
            (P::Idle | P::Searching, E::SearchCancelled) => P::Idle,
            (P::Idle, E::RoomRequested) => P::CreatingRoom,
            (P::CreatingRoom | P::WaitingForOpponent, E::RoomCreated) => P::WaitingForOpponent,
            (P::Idle, E::JoinRequested) => P::JoiningRoom,
            (P::CreatingRoom | P::WaitingForOpponent | P::JoiningRoom, E::RoomLeft) => P::Idle,
            // The server is the source of truth: a session wins over a local cancel.
            (
                P::Idle | P::Searching | P::CreatingRoom | P::WaitingForOpponent | P::JoiningRoom,
                E::SessionStarted,
            ) => P::Starting,
            (
                P::Searching | P::CreatingRoom | P::WaitingForOpponent | P::JoiningRoom,
                E::Rejected,
            ) => P::Idle,
            (P::Starting, E::Navigated) => P::InGame,
            (P::InGame, E::ReturnedToLobby) => P::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

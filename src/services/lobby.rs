use std::collections::VecDeque;

use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::RoomIdPolicy,
    connection::Connection,
    dto::{
        event::{ErrorPayload, RoomCreatedPayload, ServerEvent, SessionPayload},
        request::{CancelSearch, ClientEvent, MatchRequest, RoomRequest},
        validation::normalize_room_id,
    },
    error::{LobbyError, LobbyNotice, PreconditionError, ServerRejection},
    services::{navigation::Navigator, room_code::generate_room_id, subscription::SubscriptionStatus},
    state::{
        GameSessionHandoff, HandoffDefaults, LobbyView, RoomState, RoomStatus, SearchState,
        state_machine::{LobbyEvent, LobbyPhase, LobbyStateMachine, Snapshot, UiState},
    },
};

/// How many delivered game ids are remembered for duplicate suppression.
const DELIVERED_HISTORY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptKind {
    Search,
    HostRoom,
    JoinRoom,
}

/// The request behind the current (or last cancelled) attempt, kept for log correlation and
/// for filling fields the server leaves out of the session payload.
#[derive(Debug, Clone)]
struct Attempt {
    id: Uuid,
    kind: AttemptKind,
    request: MatchRequest,
    cancelled: bool,
}

impl Attempt {
    fn new(kind: AttemptKind, request: MatchRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            request,
            cancelled: false,
        }
    }
}

/// Client side of the matchmaking and private room protocol.
///
/// Owns the search and room state, validates local preconditions, emits requests on the injected
/// [`Connection`] and reacts to server pushes fed through [`LobbyController::handle_event`].
/// Sessions are delivered to the [`Navigator`] once per game id among the most recent deliveries.
pub struct LobbyController<C, N> {
    connection: C,
    navigator: N,
    room_ids: RoomIdPolicy,
    machine: LobbyStateMachine,
    search: SearchState,
    room: Option<RoomState>,
    attempt: Option<Attempt>,
    join_form: Option<String>,
    subscription: Option<SubscriptionStatus>,
    notice: Option<LobbyNotice>,
    delivered: VecDeque<String>,
}

impl<C: Connection, N: Navigator> LobbyController<C, N> {
    /// Build an idle lobby on top of `connection`.
    pub fn new(connection: C, navigator: N, room_ids: RoomIdPolicy) -> Self {
        Self {
            connection,
            navigator,
            room_ids,
            machine: LobbyStateMachine::new(),
            search: SearchState::default(),
            room: None,
            attempt: None,
            join_form: None,
            subscription: None,
            notice: None,
            delivered: VecDeque::with_capacity(DELIVERED_HISTORY),
        }
    }

    /// Connection the lobby emits on.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Navigator receiving game sessions.
    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Give back the connection and the navigator.
    pub fn into_parts(self) -> (C, N) {
        (self.connection, self.navigator)
    }

    /// Current lobby phase.
    pub fn phase(&self) -> LobbyPhase {
        self.machine.phase()
    }

    /// Phase as rendered by the lobby screen.
    pub fn ui_state(&self) -> UiState {
        self.machine.phase().into()
    }

    /// Phase together with its version counter.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Solo search progress.
    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// Private room in progress, if any.
    pub fn room(&self) -> Option<&RoomState> {
        self.room.as_ref()
    }

    /// Room identifier to show for sharing, once the server acknowledged the room.
    pub fn displayed_room_id(&self) -> Option<&str> {
        self.room
            .as_ref()
            .filter(|room| room.status == RoomStatus::Waiting)
            .map(|room| room.game_id.as_str())
    }

    /// Room identifier last typed into the join form.
    pub fn join_form(&self) -> Option<&str> {
        self.join_form.as_deref()
    }

    /// Message currently shown next to the last action.
    pub fn notice(&self) -> Option<&LobbyNotice> {
        self.notice.as_ref()
    }

    /// Clear the shown message.
    pub fn dismiss_error(&mut self) {
        self.notice = None;
    }

    /// Cache the subscription status used to gate solo battles.
    pub fn set_subscription_status(&mut self, raw: &str) {
        let status = SubscriptionStatus::parse(raw);
        debug!(?status, "subscription status cached");
        self.subscription = Some(status);
    }

    /// Everything needed to render the lobby.
    pub fn view(&self) -> LobbyView {
        let snapshot = self.machine.snapshot();
        LobbyView {
            phase: snapshot.phase,
            ui: snapshot.phase.into(),
            version: snapshot.version,
            search: self.search,
            room: self.room.clone(),
            join_form: self.join_form.clone(),
            notice: self.notice.clone(),
        }
    }

    /// Ask the server for an opponent.
    pub fn start_solo_search(&mut self, request: MatchRequest) -> Result<(), LobbyError> {
        if let Err(err) = self
            .check_request(&request)
            .and_then(|()| self.check_subscription())
            .and_then(|()| self.check_flow(LobbyEvent::SearchRequested))
        {
            return Err(self.refuse(err));
        }

        self.send(ClientEvent::FindOpponent(request.clone()))?;
        self.transition(LobbyEvent::SearchRequested);
        self.search.start();
        self.notice = None;

        let attempt = Attempt::new(AttemptKind::Search, request);
        info!(
            attempt_id = %attempt.id,
            subject = %attempt.request.subject,
            difficulty = %attempt.request.difficulty,
            "solo search started"
        );
        self.attempt = Some(attempt);
        Ok(())
    }

    /// Stop searching locally and tell the server, without waiting for an acknowledgement.
    ///
    /// A match the server already found may still arrive and will be honoured.
    pub fn cancel_solo_search(&mut self) {
        if self.connection.is_connected() {
            let user_id = self
                .attempt
                .as_ref()
                .filter(|attempt| attempt.kind == AttemptKind::Search)
                .map(|attempt| attempt.request.user_id.clone())
                .filter(|user_id| !user_id.is_empty());
            if let Err(err) = self
                .connection
                .emit(ClientEvent::CancelSearch(CancelSearch { user_id }))
            {
                warn!(error = %err, "failed to send search cancellation");
            }
        }

        let was_searching = self.search.is_searching;
        self.search.stop();
        if self.machine.phase() == LobbyPhase::Searching {
            self.transition(LobbyEvent::SearchCancelled);
        }

        if let Some(attempt) = self
            .attempt
            .as_mut()
            .filter(|attempt| attempt.kind == AttemptKind::Search)
        {
            attempt.cancelled = true;
            if was_searching {
                info!(attempt_id = %attempt.id, "solo search cancelled");
            }
        }
    }

    /// Open a private room under a freshly generated identifier; returns that identifier.
    ///
    /// The identifier shown for sharing is the one the server acknowledges, which may differ.
    pub fn create_private_room(&mut self, request: MatchRequest) -> Result<String, LobbyError> {
        if let Err(err) = self
            .check_request(&request)
            .and_then(|()| self.check_flow(LobbyEvent::RoomRequested))
        {
            return Err(self.refuse(err));
        }

        let game_id = generate_room_id(&self.room_ids, &mut rand::rng());
        self.send(ClientEvent::CreateRoom(RoomRequest {
            game_id: game_id.clone(),
            request: request.clone(),
        }))?;
        self.transition(LobbyEvent::RoomRequested);
        self.room = Some(RoomState::hosting(game_id.clone(), &request));
        self.notice = None;

        let attempt = Attempt::new(AttemptKind::HostRoom, request);
        info!(attempt_id = %attempt.id, %game_id, "private room requested");
        self.attempt = Some(attempt);
        Ok(game_id)
    }

    /// Join a private room by identifier; the entered identifier stays in the join form.
    pub fn join_private_room(
        &mut self,
        target_game_id: &str,
        request: MatchRequest,
    ) -> Result<(), LobbyError> {
        self.join_form = Some(target_game_id.to_string());

        let game_id = match self
            .check_request(&request)
            .and_then(|()| self.check_room_id(target_game_id))
            .and_then(|game_id| {
                self.check_flow(LobbyEvent::JoinRequested)
                    .map(|()| game_id)
            }) {
            Ok(game_id) => game_id,
            Err(err) => return Err(self.refuse(err)),
        };

        self.send(ClientEvent::JoinRoom(RoomRequest {
            game_id: game_id.clone(),
            request: request.clone(),
        }))?;
        self.transition(LobbyEvent::JoinRequested);
        self.room = Some(RoomState::joining(game_id.clone(), &request));
        self.notice = None;

        let attempt = Attempt::new(AttemptKind::JoinRoom, request);
        info!(attempt_id = %attempt.id, %game_id, "joining private room");
        self.attempt = Some(attempt);
        Ok(())
    }

    /// Abandon the current room flow locally.
    pub fn leave_room(&mut self) {
        if !self.machine.can_apply(LobbyEvent::RoomLeft) {
            return;
        }
        self.transition(LobbyEvent::RoomLeft);
        if let Some(room) = self.room.take() {
            info!(game_id = %room.game_id, "left private room");
        }
        self.attempt = None;
    }

    /// Reopen the lobby after the game screen is done.
    pub fn return_to_lobby(&mut self) {
        if self.machine.phase() == LobbyPhase::InGame {
            self.transition(LobbyEvent::ReturnedToLobby);
        }
    }

    /// One second of search time elapsed.
    pub fn tick(&mut self) {
        self.search.tick();
    }

    /// Record a change of the connection status. The lobby state is left untouched: a response
    /// to an earlier request may still arrive after a reconnect.
    pub fn handle_connection_change(&mut self, connected: bool) {
        let phase = self.machine.phase();
        if connected {
            info!(?phase, "connection to matchmaking server is up");
        } else {
            warn!(?phase, "connection to matchmaking server lost; lobby state kept");
        }
    }

    /// React to a server push.
    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::MatchFound(session) => self.on_session(session, "match-found"),
            ServerEvent::GameStart(session) => self.on_session(session, "game-start"),
            ServerEvent::RoomCreated(created) => self.on_room_created(created),
            ServerEvent::Error(error) => self.on_server_error(error),
            ServerEvent::Unknown { name } => {
                debug!(event = %name, "ignoring unhandled server event");
            }
        }
    }

    fn on_session(&mut self, session: SessionPayload, source: &'static str) {
        if self.delivered.iter().any(|game_id| *game_id == session.game_id) {
            debug!(game_id = %session.game_id, source, "duplicate session event ignored");
            return;
        }

        let from = self.machine.phase();
        if let Err(err) = self.machine.apply(LobbyEvent::SessionStarted) {
            warn!(game_id = %session.game_id, source, error = %err, "session event ignored");
            return;
        }
        if self.attempt.as_ref().is_some_and(|attempt| attempt.cancelled) {
            info!(game_id = %session.game_id, source, "session arrived after local cancel; honouring server");
        } else if from == LobbyPhase::Idle {
            info!(game_id = %session.game_id, source, "unsolicited session accepted");
        }

        self.search.stop();
        if let Some(room) = self.room.as_mut() {
            room.status = RoomStatus::Starting;
        }

        let defaults = self
            .attempt
            .as_ref()
            .map(|attempt| HandoffDefaults::from(&attempt.request))
            .unwrap_or_default();
        let is_host = self.room.as_ref().is_some_and(|room| room.is_host);
        let handoff = GameSessionHandoff::resolve(session, &defaults, is_host);

        info!(
            game_id = %handoff.game_id,
            source,
            is_bot = handoff.is_bot,
            is_host,
            "handing session to game screen"
        );
        if self.delivered.len() == DELIVERED_HISTORY {
            self.delivered.pop_front();
        }
        self.delivered.push_back(handoff.game_id.clone());
        self.navigator.navigate(handoff);
        self.transition(LobbyEvent::Navigated);

        self.room = None;
        self.attempt = None;
        self.join_form = None;
        self.notice = None;
    }

    fn on_room_created(&mut self, created: RoomCreatedPayload) {
        let phase = self.machine.phase();
        let hosting = self.room.as_ref().is_some_and(|room| room.is_host);
        if !hosting || !self.machine.can_apply(LobbyEvent::RoomCreated) {
            debug!(game_id = %created.game_id, ?phase, "stale room acknowledgement dropped");
            return;
        }

        if let Some(room) = self.room.as_mut() {
            if room.game_id != created.game_id {
                info!(
                    requested = %room.game_id,
                    assigned = %created.game_id,
                    "server assigned a different room id"
                );
            }
            room.game_id = created.game_id;
            room.status = RoomStatus::Waiting;
            info!(game_id = %room.game_id, "room created; waiting for opponent");
        }
        self.transition(LobbyEvent::RoomCreated);
    }

    fn on_server_error(&mut self, error: ErrorPayload) {
        let phase = self.machine.phase();
        if !self.machine.can_apply(LobbyEvent::Rejected) {
            debug!(?phase, message = %error.message, "stale server error dropped");
            return;
        }

        let rejection = ServerRejection::new(error.message);
        warn!(
            ?phase,
            kind = ?rejection.kind,
            message = %rejection.message,
            "server rejected lobby request"
        );

        self.search.stop();
        self.room = None;
        self.attempt = None;
        self.transition(LobbyEvent::Rejected);
        self.notice = Some(LobbyNotice::Rejected(rejection));
    }

    fn check_request(&self, request: &MatchRequest) -> Result<(), PreconditionError> {
        if request.subject.trim().is_empty() {
            return Err(PreconditionError::MissingSubject);
        }
        if !self.connection.is_connected() {
            return Err(PreconditionError::NotConnected);
        }
        request
            .validate()
            .map_err(|errors| PreconditionError::InvalidRequest(errors.to_string()))
    }

    fn check_subscription(&self) -> Result<(), PreconditionError> {
        match &self.subscription {
            Some(status) if !status.allows_battles() => {
                Err(PreconditionError::SubscriptionRequired)
            }
            _ => Ok(()),
        }
    }

    fn check_room_id(&self, raw: &str) -> Result<String, PreconditionError> {
        if raw.trim().is_empty() {
            return Err(PreconditionError::MissingRoomId);
        }
        normalize_room_id(raw, &self.room_ids).map_err(|err| {
            PreconditionError::InvalidRoomId(
                err.message
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| err.code.to_string()),
            )
        })
    }

    fn check_flow(&self, event: LobbyEvent) -> Result<(), PreconditionError> {
        if self.machine.can_apply(event) {
            Ok(())
        } else {
            Err(PreconditionError::FlowInProgress(self.machine.phase()))
        }
    }

    /// Surface a precondition failure next to the action.
    fn refuse(&mut self, err: PreconditionError) -> LobbyError {
        debug!(error = %err, "lobby action refused");
        self.notice = Some(LobbyNotice::Precondition(err.clone()));
        err.into()
    }

    fn send(&mut self, event: ClientEvent) -> Result<(), LobbyError> {
        let name = event.name();
        match self.connection.emit(event) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(event = name, error = %err, "failed to emit lobby request");
                self.notice = Some(LobbyNotice::Connectivity(err.to_string()));
                Err(err.into())
            }
        }
    }

    fn transition(&mut self, event: LobbyEvent) {
        match self.machine.apply(event) {
            Ok(phase) => debug!(?event, ?phase, "lobby transition"),
            Err(err) => warn!(error = %err, "lobby transition rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        connection::MemoryConnection,
        dto::request::Difficulty,
        error::RejectionKind,
    };

    type Lobby = LobbyController<MemoryConnection, Vec<GameSessionHandoff>>;

    fn lobby(connected: bool) -> (Lobby, MemoryConnection) {
        let connection = MemoryConnection::new(connected);
        let controller = LobbyController::new(connection.clone(), Vec::new(), RoomIdPolicy::default());
        (controller, connection)
    }

    fn request() -> MatchRequest {
        MatchRequest {
            subject: "sql".into(),
            difficulty: Difficulty::Medium,
            user_id: "u1".into(),
            player_name: "Alex".into(),
            duration_seconds: Some(600),
            challenge_type_label: "Bullet Surge".into(),
        }
    }

    fn event(name: &str, payload: serde_json::Value) -> ServerEvent {
        ServerEvent::decode(name, payload).unwrap()
    }

    #[test]
    fn missing_subject_is_reported_before_connectivity() {
        let (mut lobby, connection) = lobby(false);
        let mut blank = request();
        blank.subject = " ".into();

        let err = lobby.start_solo_search(blank).unwrap_err();
        assert!(matches!(
            err,
            LobbyError::Precondition(PreconditionError::MissingSubject)
        ));
        assert!(connection.emitted().is_empty());
        assert_eq!(lobby.phase(), LobbyPhase::Idle);
    }

    #[test]
    fn subscription_gate_blocks_search_only() {
        let (mut lobby, connection) = lobby(true);
        lobby.set_subscription_status("not_subscribed");

        let err = lobby.start_solo_search(request()).unwrap_err();
        assert!(matches!(
            err,
            LobbyError::Precondition(PreconditionError::SubscriptionRequired)
        ));
        assert!(!lobby.search().is_searching);

        lobby.create_private_room(request()).unwrap();
        assert_eq!(connection.emitted().len(), 1);
    }

    #[test]
    fn search_and_room_flows_are_exclusive() {
        let (mut lobby, connection) = lobby(true);
        lobby.start_solo_search(request()).unwrap();

        let err = lobby.create_private_room(request()).unwrap_err();
        assert!(matches!(
            err,
            LobbyError::Precondition(PreconditionError::FlowInProgress(LobbyPhase::Searching))
        ));
        assert!(lobby.join_private_room("SQLAB12CD", request()).is_err());
        assert_eq!(connection.emitted().len(), 1);
        assert!(lobby.room().is_none());
    }

    #[test]
    fn create_room_uses_generated_id_until_acknowledged() {
        let (mut lobby, connection) = lobby(true);
        let generated = lobby.create_private_room(request()).unwrap();

        assert!(generated.starts_with("SQL"));
        assert_eq!(lobby.room().unwrap().status, RoomStatus::Creating);
        assert_eq!(lobby.displayed_room_id(), None);
        match &connection.emitted()[0] {
            ClientEvent::CreateRoom(room) => assert_eq!(room.game_id, generated),
            other => panic!("expected create-room, got {other:?}"),
        }

        lobby.handle_event(event("room-created", json!({ "gameId": generated })));
        assert_eq!(lobby.phase(), LobbyPhase::WaitingForOpponent);
        assert_eq!(lobby.displayed_room_id(), Some(generated.as_str()));
    }

    #[test]
    fn stale_room_acknowledgement_is_dropped() {
        let (mut lobby, _connection) = lobby(true);
        lobby.create_private_room(request()).unwrap();
        lobby.leave_room();
        assert_eq!(lobby.phase(), LobbyPhase::Idle);

        lobby.handle_event(event("room-created", json!({ "gameId": "SQLZZZZZZ" })));
        assert_eq!(lobby.phase(), LobbyPhase::Idle);
        assert!(lobby.room().is_none());
    }

    #[test]
    fn join_room_normalizes_identifier() {
        let (mut lobby, connection) = lobby(true);
        lobby.join_private_room(" sqlab12cd ", request()).unwrap();

        assert_eq!(lobby.phase(), LobbyPhase::JoiningRoom);
        assert_eq!(lobby.join_form(), Some(" sqlab12cd "));
        match &connection.emitted()[0] {
            ClientEvent::JoinRoom(room) => assert_eq!(room.game_id, "SQLAB12CD"),
            other => panic!("expected join-room, got {other:?}"),
        }
    }

    #[test]
    fn malformed_room_ids_never_reach_the_server() {
        let (mut lobby, connection) = lobby(true);

        let err = lobby.join_private_room("", request()).unwrap_err();
        assert!(matches!(
            err,
            LobbyError::Precondition(PreconditionError::MissingRoomId)
        ));

        let err = lobby.join_private_room("SQL-12", request()).unwrap_err();
        assert!(matches!(
            err,
            LobbyError::Precondition(PreconditionError::InvalidRoomId(_))
        ));
        assert_eq!(lobby.join_form(), Some("SQL-12"));
        assert!(connection.emitted().is_empty());
    }

    #[test]
    fn rejection_is_classified_and_dismissible() {
        let (mut lobby, _connection) = lobby(true);
        lobby.join_private_room("SQLAB12CD", request()).unwrap();
        lobby.handle_event(event("error", json!({ "message": "Room is full" })));

        match lobby.notice() {
            Some(LobbyNotice::Rejected(rejection)) => {
                assert_eq!(rejection.kind, RejectionKind::RoomFull)
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        lobby.dismiss_error();
        assert!(lobby.notice().is_none());
    }

    #[test]
    fn stale_error_while_idle_is_dropped() {
        let (mut lobby, _connection) = lobby(true);
        lobby.start_solo_search(request()).unwrap();
        lobby.cancel_solo_search();

        lobby.handle_event(event("error", json!("No opponents available")));
        assert!(lobby.notice().is_none());
        assert_eq!(lobby.phase(), LobbyPhase::Idle);
    }

    #[test]
    fn disconnect_freezes_lobby_state() {
        let (mut lobby, connection) = lobby(true);
        lobby.create_private_room(request()).unwrap();
        lobby.handle_event(event("room-created", json!({ "gameId": "SQLAB12CD" })));

        connection.set_connected(false);
        lobby.handle_connection_change(false);
        assert_eq!(lobby.phase(), LobbyPhase::WaitingForOpponent);
        assert_eq!(lobby.displayed_room_id(), Some("SQLAB12CD"));
        assert!(lobby.notice().is_none());

        // The opponent may still show up once the socket is back.
        connection.set_connected(true);
        lobby.handle_connection_change(true);
        lobby.handle_event(event("game-start", json!({ "gameId": "SQLAB12CD" })));
        assert_eq!(lobby.navigator().len(), 1);
        assert!(lobby.navigator()[0].is_host);
    }

    #[test]
    fn cancel_emits_user_of_the_search() {
        let (mut lobby, connection) = lobby(true);
        lobby.start_solo_search(request()).unwrap();
        connection.take_emitted();

        lobby.cancel_solo_search();
        assert_eq!(
            connection.emitted(),
            vec![ClientEvent::CancelSearch(CancelSearch {
                user_id: Some("u1".into())
            })]
        );
    }

    #[test]
    fn cancel_while_disconnected_still_resets() {
        let (mut lobby, connection) = lobby(true);
        lobby.start_solo_search(request()).unwrap();
        connection.take_emitted();
        connection.set_connected(false);

        lobby.cancel_solo_search();
        assert!(!lobby.search().is_searching);
        assert_eq!(lobby.phase(), LobbyPhase::Idle);
        assert!(connection.emitted().is_empty());
    }

    #[test]
    fn tick_counts_only_while_searching() {
        let (mut lobby, _connection) = lobby(true);
        lobby.tick();
        assert_eq!(lobby.search().elapsed_seconds, 0);

        lobby.start_solo_search(request()).unwrap();
        lobby.tick();
        lobby.tick();
        assert_eq!(lobby.search().elapsed_seconds, 2);

        lobby.handle_event(event("match-found", json!({ "gameId": "G1" })));
        lobby.tick();
        assert_eq!(lobby.search().elapsed_seconds, 0);
    }

    #[test]
    fn new_attempts_need_return_to_lobby() {
        let (mut lobby, _connection) = lobby(true);
        lobby.start_solo_search(request()).unwrap();
        lobby.handle_event(event("match-found", json!({ "gameId": "G1" })));
        assert_eq!(lobby.ui_state(), UiState::NavigatingToGame);

        assert!(lobby.start_solo_search(request()).is_err());
        lobby.return_to_lobby();
        lobby.start_solo_search(request()).unwrap();
        assert_eq!(lobby.phase(), LobbyPhase::Searching);
    }

    #[test]
    fn delivered_history_is_bounded() {
        let (mut lobby, _connection) = lobby(true);
        for game in 0..(DELIVERED_HISTORY + 8) {
            lobby.handle_event(event("match-found", json!({ "gameId": format!("G{game}") })));
            lobby.return_to_lobby();
        }
        assert_eq!(lobby.delivered.len(), DELIVERED_HISTORY);
        assert_eq!(lobby.navigator().len(), DELIVERED_HISTORY + 8);

        let latest = format!("G{}", DELIVERED_HISTORY + 7);
        lobby.handle_event(event("match-found", json!({ "gameId": latest })));
        assert_eq!(lobby.navigator().len(), DELIVERED_HISTORY + 8);
        assert_eq!(lobby.phase(), LobbyPhase::Idle);
    }

    #[test]
    fn view_reflects_state() {
        let (mut lobby, _connection) = lobby(true);
        lobby.start_solo_search(request()).unwrap();
        lobby.tick();

        let view = lobby.view();
        assert_eq!(view.ui, UiState::Searching);
        assert_eq!(view.search.elapsed_seconds, 1);
        assert_eq!(view.version, 1);
        assert!(view.room.is_none());
    }
}

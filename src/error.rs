use thiserror::Error;

use crate::{dto::frame::FrameError, state::state_machine::LobbyPhase};

const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";

/// Local validation failures; these never reach the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    /// No subject was chosen.
    #[error("subject is required")]
    MissingSubject,
    /// The connection to the matchmaking server is down.
    #[error("not connected to the matchmaking server")]
    NotConnected,
    /// The cached subscription status rules out battles.
    #[error("an active subscription is required to battle")]
    SubscriptionRequired,
    /// The join form is empty.
    #[error("room id is required")]
    MissingRoomId,
    /// The join form holds a malformed identifier.
    #[error("invalid room id: {0}")]
    InvalidRoomId(String),
    /// Some other request field failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// A solo search or a room flow is already running.
    #[error("another lobby flow is already in progress ({0:?})")]
    FlowInProgress(LobbyPhase),
}

impl PreconditionError {
    /// Text shown next to the action that failed.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingSubject | Self::NotConnected => REQUIRED_FIELDS_MESSAGE.to_string(),
            Self::SubscriptionRequired => "Subscribe to unlock battles".to_string(),
            Self::MissingRoomId => "Please enter a room ID".to_string(),
            Self::InvalidRoomId(reason) => format!("Invalid room ID: {reason}"),
            Self::InvalidRequest(reason) => reason.clone(),
            Self::FlowInProgress(_) => {
                "Finish or cancel the current matchmaking first".to_string()
            }
        }
    }
}

/// Coarse classification of a server rejection, used to pick the right inline hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The room does not exist.
    RoomNotFound,
    /// The room already has two players.
    RoomFull,
    /// The server requires a subscription.
    SubscriptionRequired,
    /// Anything else.
    Other,
}

impl RejectionKind {
    /// Classify a server message by its wording.
    pub fn classify(message: &str) -> Self {
        let message = message.to_ascii_lowercase();
        if message.contains("not found") || message.contains("does not exist") {
            Self::RoomNotFound
        } else if message.contains("full") {
            Self::RoomFull
        } else if message.contains("subscri") {
            Self::SubscriptionRequired
        } else {
            Self::Other
        }
    }
}

/// Explicit error event pushed by the server; the message is shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServerRejection {
    /// Classification of `message`.
    pub kind: RejectionKind,
    /// Server wording.
    pub message: String,
}

impl ServerRejection {
    /// Wrap a server message, classifying it on the way.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: RejectionKind::classify(&message),
            message,
        }
    }
}

/// Errors raised by a connection when emitting.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The socket is currently down; nothing is queued.
    #[error("connection to the matchmaking server is down")]
    Disconnected,
    /// The connection has been shut down for good.
    #[error("connection closed")]
    Closed,
    /// The event could not be framed.
    #[error("failed to encode event: {0}")]
    Encode(#[from] FrameError),
}

/// Errors returned by lobby controller operations.
#[derive(Debug, Error)]
pub enum LobbyError {
    /// Local validation failed; nothing was sent.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    /// The request could not be handed to the connection.
    #[error("connectivity error: {0}")]
    Connectivity(#[from] ConnectionError),
}

/// User-facing notice rendered inline near the failing action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyNotice {
    /// Local validation failed.
    Precondition(PreconditionError),
    /// The server rejected the attempt.
    Rejected(ServerRejection),
    /// The request could not be sent.
    Connectivity(String),
}

impl LobbyNotice {
    /// Text to display.
    pub fn message(&self) -> String {
        match self {
            Self::Precondition(err) => err.user_message(),
            Self::Rejected(rejection) => rejection.message.clone(),
            Self::Connectivity(reason) => format!("Connection problem: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_share_one_message() {
        assert_eq!(
            PreconditionError::MissingSubject.user_message(),
            PreconditionError::NotConnected.user_message()
        );
        assert_eq!(
            PreconditionError::NotConnected.user_message(),
            "Please fill in all required fields"
        );
    }

    #[test]
    fn rejections_are_classified() {
        assert_eq!(
            ServerRejection::new("Game not found").kind,
            RejectionKind::RoomNotFound
        );
        assert_eq!(ServerRejection::new("Room is full").kind, RejectionKind::RoomFull);
        assert_eq!(
            ServerRejection::new("Subscription required").kind,
            RejectionKind::SubscriptionRequired
        );
        assert_eq!(ServerRejection::new("boom").kind, RejectionKind::Other);
    }

    #[test]
    fn rejected_notice_is_verbatim() {
        let notice = LobbyNotice::Rejected(ServerRejection::new("Game not found"));
        assert_eq!(notice.message(), "Game not found");
    }
}

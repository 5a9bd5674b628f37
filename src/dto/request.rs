use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

use crate::dto::validation::validate_subject;

/// Ask the server for a random opponent.
pub const EVENT_FIND_OPPONENT: &str = "find-opponent";
/// Withdraw from the solo search queue.
pub const EVENT_CANCEL_SEARCH: &str = "cancel-search";
/// Open a private room under a client-chosen identifier.
pub const EVENT_CREATE_ROOM: &str = "create-room";
/// Join an existing private room.
pub const EVENT_JOIN_ROOM: &str = "join-room";

/// Difficulty label requested for a battle.
///
/// Both the current labels and the older `beginner`/`intermediate`/`hard` spellings are accepted,
/// and each is sent back to the server exactly as the caller chose it. Use [`Difficulty::tier`]
/// to compare labels by level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Entry level questions.
    #[default]
    Easy,
    /// Intermediate questions.
    Medium,
    /// Hardest tier.
    Advanced,
    /// Older spelling of [`Difficulty::Easy`].
    Beginner,
    /// Older spelling of [`Difficulty::Medium`].
    Intermediate,
    /// Older spelling of [`Difficulty::Advanced`].
    Hard,
}

impl Difficulty {
    /// Wire label, spelled as chosen.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Advanced => "advanced",
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Hard => "hard",
        }
    }

    /// Level this label stands for, under its current spelling.
    pub fn tier(self) -> Self {
        match self {
            Self::Easy | Self::Beginner => Self::Easy,
            Self::Medium | Self::Intermediate => Self::Medium,
            Self::Advanced | Self::Hard => Self::Advanced,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a difficulty label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty `{0}` (expected easy, medium or advanced)")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "advanced" => Ok(Self::Advanced),
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "hard" => Ok(Self::Hard),
            _ => Err(UnknownDifficulty(value.to_string())),
        }
    }
}

/// Parameters of a solo search or a private room, as sent to the matchmaking server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    /// Topic of the questions, required.
    #[validate(custom(function = "validate_subject"))]
    pub subject: String,
    /// Requested difficulty label.
    pub difficulty: Difficulty,
    /// Identity of the player; may be empty for anonymous play.
    #[validate(length(max = 128))]
    pub user_id: String,
    /// Name shown to the opponent.
    #[validate(length(max = 64))]
    pub player_name: String,
    /// Battle length; `None` lets the server pick its default.
    pub duration_seconds: Option<u64>,
    /// Challenge mode chosen in the lobby.
    #[validate(length(max = 64))]
    pub challenge_type_label: String,
}

/// Room creation or join request: the room identifier plus the match parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    /// Room identifier, generated locally for creation or typed in for a join.
    pub game_id: String,
    /// Match parameters sent alongside the identifier.
    #[serde(flatten)]
    pub request: MatchRequest,
}

/// Payload of a `cancel-search` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSearch {
    /// Player whose search is withdrawn, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Messages the client sends to the matchmaking server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// `find-opponent`: start a solo search.
    FindOpponent(MatchRequest),
    /// `cancel-search`: best-effort withdrawal of a solo search.
    CancelSearch(CancelSearch),
    /// `create-room`: open a private room.
    CreateRoom(RoomRequest),
    /// `join-room`: join a private room.
    JoinRoom(RoomRequest),
}

impl ClientEvent {
    /// Event name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FindOpponent(_) => EVENT_FIND_OPPONENT,
            Self::CancelSearch(_) => EVENT_CANCEL_SEARCH,
            Self::CreateRoom(_) => EVENT_CREATE_ROOM,
            Self::JoinRoom(_) => EVENT_JOIN_ROOM,
        }
    }

    /// JSON payload carried next to the event name.
    pub fn payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::FindOpponent(request) => serde_json::to_value(request),
            Self::CancelSearch(cancel) => serde_json::to_value(cancel),
            Self::CreateRoom(room) | Self::JoinRoom(room) => serde_json::to_value(room),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request() -> MatchRequest {
        MatchRequest {
            subject: "sql".into(),
            difficulty: Difficulty::Easy,
            user_id: "u1".into(),
            player_name: "Alex".into(),
            duration_seconds: Some(600),
            challenge_type_label: "Bullet Surge".into(),
        }
    }

    #[test]
    fn difficulty_accepts_legacy_labels() {
        assert_eq!("beginner".parse::<Difficulty>().unwrap(), Difficulty::Beginner);
        assert_eq!(" Medium ".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!("hard".parse::<Difficulty>().unwrap().tier(), Difficulty::Advanced);
        assert!("expert".parse::<Difficulty>().is_err());

        let parsed: Difficulty = serde_json::from_value(json!("beginner")).unwrap();
        assert_eq!(parsed.tier(), Difficulty::Easy);
    }

    #[test]
    fn legacy_difficulty_label_is_sent_as_given() {
        let request: MatchRequest = serde_json::from_value(json!({
            "subject": "sql",
            "difficulty": "beginner",
            "userId": "u1",
            "playerName": "Alex",
            "durationSeconds": 600,
            "challengeTypeLabel": "Bullet Surge",
        }))
        .unwrap();

        let payload = ClientEvent::FindOpponent(request).payload().unwrap();
        assert_eq!(payload["difficulty"], "beginner");
        assert_eq!(Difficulty::Intermediate.to_string(), "intermediate");
    }

    #[test]
    fn find_opponent_payload_uses_camel_case_fields() {
        let payload = ClientEvent::FindOpponent(request()).payload().unwrap();
        assert_eq!(
            payload,
            json!({
                "subject": "sql",
                "difficulty": "easy",
                "userId": "u1",
                "playerName": "Alex",
                "durationSeconds": 600,
                "challengeTypeLabel": "Bullet Surge",
            })
        );
    }

    #[test]
    fn room_payload_flattens_request_next_to_game_id() {
        let event = ClientEvent::JoinRoom(RoomRequest {
            game_id: "SQLAB12CD".into(),
            request: MatchRequest {
                duration_seconds: None,
                ..request()
            },
        });
        assert_eq!(event.name(), "join-room");

        let payload = event.payload().unwrap();
        assert_eq!(payload["gameId"], "SQLAB12CD");
        assert_eq!(payload["subject"], "sql");
        assert!(payload["durationSeconds"].is_null());
    }

    #[test]
    fn cancel_without_user_is_empty_object() {
        let payload = ClientEvent::CancelSearch(CancelSearch::default())
            .payload()
            .unwrap();
        assert_eq!(payload, json!({}));
    }

    #[test]
    fn validation_rejects_blank_subject() {
        let mut invalid = request();
        invalid.subject = "  ".into();
        assert!(invalid.validate().is_err());
        assert!(request().validate().is_ok());
    }
}

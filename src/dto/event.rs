//! Server-pushed events and their payloads.
//!
//! Session payloads are forwarded to the game screen, so they are decoded leniently: only the game
//! identifier is required, and any other field of the wrong type falls back to its default.

use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::{Map, Value};
use serde_with::{DefaultOnError, DefaultOnNull, DisplayFromStr, PickFirst, serde_as};

/// Solo search paired this client.
pub const EVENT_MATCH_FOUND: &str = "match-found";
/// Private room acknowledged.
pub const EVENT_ROOM_CREATED: &str = "room-created";
/// Private room complete, game begins.
pub const EVENT_GAME_START: &str = "game-start";
/// Current attempt rejected.
pub const EVENT_ERROR: &str = "error";

/// Server-pushed messages, decoupled from the transport's event names.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Solo search paired this client with an opponent (or a bot).
    MatchFound(SessionPayload),
    /// The server opened the private room requested by this client.
    RoomCreated(RoomCreatedPayload),
    /// A private room is complete and the game begins.
    GameStart(SessionPayload),
    /// The server rejected the current attempt.
    Error(ErrorPayload),
    /// Any event this client does not act on.
    Unknown {
        /// Event name as received.
        name: String,
    },
}

impl ServerEvent {
    /// Decode a named event and its payload, folding tolerated aliases onto one variant.
    pub fn decode(name: &str, payload: Value) -> Result<Self, serde_json::Error> {
        let event = match name {
            EVENT_MATCH_FOUND | "matchFound" => Self::MatchFound(serde_json::from_value(payload)?),
            EVENT_ROOM_CREATED | "roomCreated" => Self::RoomCreated(RoomCreatedPayload::parse(payload)?),
            EVENT_GAME_START | "gameStart" | "game-started" | "room-joined" | "roomJoined" => {
                Self::GameStart(serde_json::from_value(payload)?)
            }
            EVENT_ERROR | "join-error" | "room-error" => Self::Error(ErrorPayload::parse(payload)),
            other => Self::Unknown {
                name: other.to_string(),
            },
        };
        Ok(event)
    }

    /// Identifier of the game carried by success events.
    pub fn game_id(&self) -> Option<&str> {
        match self {
            Self::MatchFound(session) | Self::GameStart(session) => Some(&session.game_id),
            Self::RoomCreated(created) => Some(&created.game_id),
            Self::Error(_) | Self::Unknown { .. } => None,
        }
    }
}

/// Session details pushed with `match-found` and `game-start`.
///
/// Only `gameId` is mandatory and may arrive as a string or a number. Every other known field is
/// decoded best-effort; anything the server adds beyond them is kept in `extra` and forwarded
/// untouched to the game screen.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// Identifier of the game to open.
    #[serde(alias = "roomId", deserialize_with = "scalar_game_id")]
    pub game_id: String,
    /// Challenge mode chosen by the server.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub challenge_type: Option<String>,
    /// Subject chosen by the server.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub subject: Option<String>,
    /// Battle length in seconds; numeric strings are accepted.
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default, alias = "durationSeconds")]
    pub custom_time: Option<u64>,
    /// Whether the opponent is a bot; `null` counts as `false`.
    #[serde_as(as = "DefaultOnError<DefaultOnNull>")]
    #[serde(default)]
    pub is_bot: bool,
    /// Opponent summary, dropped when it is not an object.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub opponent: Option<OpponentInfo>,
    /// Fields this client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept the game identifier as a JSON string or number.
fn scalar_game_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(game_id) if !game_id.trim().is_empty() => Ok(game_id),
        Value::Number(game_id) => Ok(game_id.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a non-empty game id, found {other}"
        ))),
    }
}

/// Opponent summary chosen by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentInfo {
    /// Opponent's user identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Opponent's display name.
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
}

/// Acknowledgement of a room creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreatedPayload {
    /// Identifier the server assigned to the room.
    #[serde(alias = "roomId")]
    pub game_id: String,
}

impl RoomCreatedPayload {
    /// Accepts either `{ "gameId": ... }` or the bare identifier string.
    fn parse(payload: Value) -> Result<Self, serde_json::Error> {
        match payload {
            Value::String(game_id) => Ok(Self { game_id }),
            other => serde_json::from_value(other),
        }
    }
}

/// Human-readable rejection sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPayload {
    /// Message to show verbatim.
    pub message: String,
}

impl ErrorPayload {
    const FALLBACK_MESSAGE: &'static str = "The matchmaking server reported an error";

    /// Error payloads come as a bare string, `{ "message": ... }` or `{ "error": ... }`.
    fn parse(payload: Value) -> Self {
        let message = match &payload {
            Value::String(message) => Some(message.clone()),
            Value::Object(fields) => fields
                .get("message")
                .or_else(|| fields.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };

        Self {
            message: message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| Self::FALLBACK_MESSAGE.to_string()),
        }
    }
}

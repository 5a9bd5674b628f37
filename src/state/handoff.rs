use serde::Serialize;
use serde_json::{Map, Value};

use crate::dto::{
    event::{OpponentInfo, SessionPayload},
    request::MatchRequest,
};

/// Session handed from the lobby to the game screen.
///
/// Built once per game from the server payload; the lobby keeps nothing but the `game_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionHandoff {
    /// Game to open.
    pub game_id: String,
    /// Challenge mode, from the server or the local request.
    pub challenge_type: String,
    /// Subject, from the server or the local request.
    pub subject: String,
    /// Battle length, from the server or the local request.
    pub custom_time: Option<u64>,
    /// The opponent is a bot.
    pub is_bot: bool,
    /// This client opened the private room.
    pub is_host: bool,
    /// Opponent summary, when the server sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<OpponentInfo>,
    /// Server fields the lobby does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Locally known values used when the server omits them from a session payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandoffDefaults {
    /// Requested subject.
    pub subject: String,
    /// Requested battle length.
    pub custom_time: Option<u64>,
    /// Requested challenge mode.
    pub challenge_type: String,
}

impl From<&MatchRequest> for HandoffDefaults {
    fn from(request: &MatchRequest) -> Self {
        Self {
            subject: request.subject.clone(),
            custom_time: request.duration_seconds,
            challenge_type: request.challenge_type_label.clone(),
        }
    }
}

impl GameSessionHandoff {
    /// Merge a server payload with local defaults; server values take precedence.
    pub fn resolve(payload: SessionPayload, defaults: &HandoffDefaults, is_host: bool) -> Self {
        let SessionPayload {
            game_id,
            challenge_type,
            subject,
            custom_time,
            is_bot,
            opponent,
            extra,
        } = payload;

        Self {
            game_id,
            challenge_type: non_empty(challenge_type)
                .unwrap_or_else(|| defaults.challenge_type.clone()),
            subject: non_empty(subject).unwrap_or_else(|| defaults.subject.clone()),
            custom_time: custom_time.or(defaults.custom_time),
            is_bot,
            is_host,
            opponent,
            extra,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

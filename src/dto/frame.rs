//! Text framing for socket events: a JSON array holding the event name and its payload.
//!
//! Frames travel as plain WebSocket text messages, e.g. `["find-opponent",{"subject":"sql",...}]`.
//! This is not a Socket.IO transport: there is no Engine.IO connect handshake and no ping/pong
//! exchange. A leading `42` on inbound frames is tolerated and stripped; bare Engine.IO control
//! packets such as `2` or `40` are rejected as [`FrameError::NotAnEventArray`].

use serde_json::Value;
use thiserror::Error;

use crate::dto::{event::ServerEvent, request::ClientEvent};

const EVENT_PACKET_PREFIX: &str = "42";

/// Errors raised while encoding or decoding event frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The text is not JSON.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    /// Valid JSON, but not a `[name, payload]` array.
    #[error("frame is not an event array")]
    NotAnEventArray,
    /// The array is empty or its first element is not a string.
    #[error("event array has no event name")]
    MissingEventName,
    /// A known event carried a payload that could not be decoded.
    #[error("invalid payload for `{event}`: {source}")]
    Payload {
        /// Event name as received.
        event: String,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Serialize an outbound event into a text frame.
pub fn encode(event: &ClientEvent) -> Result<String, FrameError> {
    let payload = event.payload()?;
    let frame = Value::Array(vec![Value::String(event.name().to_string()), payload]);
    Ok(serde_json::to_string(&frame)?)
}

/// Parse an inbound text frame into a typed server event.
pub fn decode(text: &str) -> Result<ServerEvent, FrameError> {
    let body = text.trim();
    let body = body.strip_prefix(EVENT_PACKET_PREFIX).unwrap_or(body);

    let Value::Array(mut parts) = serde_json::from_str::<Value>(body)? else {
        return Err(FrameError::NotAnEventArray);
    };
    if parts.is_empty() {
        return Err(FrameError::MissingEventName);
    }

    let name = match parts.remove(0) {
        Value::String(name) => name,
        _ => return Err(FrameError::MissingEventName),
    };
    let payload = if parts.is_empty() {
        Value::Null
    } else {
        parts.swap_remove(0)
    };

    ServerEvent::decode(&name, payload).map_err(|source| FrameError::Payload {
        event: name,
        source,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dto::request::{CancelSearch, Difficulty, MatchRequest};

    #[test]
    fn encodes_name_then_payload() {
        let frame = encode(&ClientEvent::FindOpponent(MatchRequest {
            subject: "sql".into(),
            difficulty: Difficulty::Medium,
            user_id: "u1".into(),
            player_name: "Alex".into(),
            duration_seconds: None,
            challenge_type_label: "Bullet Surge".into(),
        }))
        .unwrap();

        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value[0], "find-opponent");
        assert_eq!(value[1]["difficulty"], "medium");
        assert_eq!(value[1]["userId"], "u1");
    }

    #[test]
    fn encodes_cancel_with_user() {
        let frame = encode(&ClientEvent::CancelSearch(CancelSearch {
            user_id: Some("u1".into()),
        }))
        .unwrap();
        assert_eq!(frame, r#"["cancel-search",{"userId":"u1"}]"#);
    }

    #[test]
    fn decodes_plain_and_prefixed_frames() {
        let plain = decode(r#"["room-created",{"gameId":"SQLAB12CD"}]"#).unwrap();
        assert_eq!(plain.game_id(), Some("SQLAB12CD"));

        let prefixed = decode(r#"42["match-found",{"gameId":"G1"}]"#).unwrap();
        assert!(matches!(prefixed, ServerEvent::MatchFound(_)));
    }

    #[test]
    fn engine_io_control_packets_are_not_events() {
        for packet in ["2", "3", "40", "41"] {
            assert!(
                matches!(decode(packet), Err(FrameError::NotAnEventArray)),
                "{packet} should not decode as an event"
            );
        }
    }

    #[test]
    fn decodes_event_without_payload() {
        let event = decode(r#"["error"]"#).unwrap();
        assert!(matches!(event, ServerEvent::Error(_)));
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(matches!(decode("not json"), Err(FrameError::Json(_))));
        assert!(matches!(
            decode(r#"{"event":"error"}"#),
            Err(FrameError::NotAnEventArray)
        ));
        assert!(matches!(decode("[]"), Err(FrameError::MissingEventName)));
        assert!(matches!(decode("[1, {}]"), Err(FrameError::MissingEventName)));

        let err = decode(&json!(["game-start", {"subject": "sql"}]).to_string()).unwrap_err();
        assert!(matches!(err, FrameError::Payload { ref event, .. } if event == "game-start"));
    }
}

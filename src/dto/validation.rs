//! Validation helpers for lobby requests.

use validator::ValidationError;

use crate::config::RoomIdPolicy;

/// Validates that a subject contains at least one non-whitespace character.
pub fn validate_subject(subject: &str) -> Result<(), ValidationError> {
    if subject.trim().is_empty() {
        let mut err = ValidationError::new("subject_required");
        err.message = Some("Subject must not be empty".into());
        return Err(err);
    }

    Ok(())
}

/// Normalizes a user-entered room identifier and checks it against `policy`.
///
/// Surrounding whitespace is dropped and letters are uppercased before the checks run, so
/// identifiers are effectively case-insensitive.
///
/// # Examples
///
/// ```ignore
/// normalize_room_id(" sqlab12cd ", &policy) // Ok("SQLAB12CD")
/// normalize_room_id("SQL-AB12", &policy)    // Err - dash
/// normalize_room_id("AB", &policy)          // Err - too short
/// ```
pub fn normalize_room_id(raw: &str, policy: &RoomIdPolicy) -> Result<String, ValidationError> {
    let candidate = raw.trim().to_ascii_uppercase();

    if candidate.is_empty() {
        let mut err = ValidationError::new("room_id_required");
        err.message = Some("Room ID must not be empty".into());
        return Err(err);
    }

    let len = candidate.chars().count();
    if len < policy.min_len || len > policy.max_len {
        let mut err = ValidationError::new("room_id_length");
        err.message = Some(
            format!(
                "Room ID must be between {} and {} characters (got {len})",
                policy.min_len, policy.max_len
            )
            .into(),
        );
        return Err(err);
    }

    if !candidate.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("room_id_format");
        err.message = Some("Room ID must contain only letters and digits".into());
        return Err(err);
    }

    Ok(candidate)
}

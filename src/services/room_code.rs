use rand::Rng;

use crate::config::RoomIdPolicy;

/// Uppercase letters and digits without the look-alikes `0`, `O`, `1` and `I`.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a private room identifier: the policy prefix followed by random characters.
pub fn generate_room_id<R: Rng + ?Sized>(policy: &RoomIdPolicy, rng: &mut R) -> String {
    let mut id = String::with_capacity(policy.prefix.len() + policy.random_len);
    id.push_str(&policy.prefix);
    for _ in 0..policy.random_len {
        id.push(ALPHABET[rng.random_range(0..ALPHABET.len())] as char);
    }
    id
}

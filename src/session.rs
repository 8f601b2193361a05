//! Per-render session tokens.
//!
//! A token is minted whenever the form is rendered and again after each
//! successful submission. Nothing on a server remembers it, so checking it
//! only proves the submitting client kept a well-formed token around. It is
//! a bot heuristic, not CSRF protection.

use chrono::{DateTime, Utc};
use rand::RngCore;
use std::fmt::Debug;

/// Number of random bytes in a session token.
pub const TOKEN_BYTES: usize = 32;

/// Length of a hex-rendered session token.
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Source of cryptographically strong random bytes.
pub trait RandomBytesSource: Send + Sync + Debug {
    /// Fills `dest` entirely.
    fn fill_bytes(&self, dest: &mut [u8]);
}

/// Random bytes from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomBytesSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(dest);
    }
}

/// Generates a fresh token: 32 random bytes as 64 lowercase hex digits.
pub fn generate_session_token(random: &dyn RandomBytesSource) -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    random.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Checks the token is exactly 64 lowercase hex digits.
pub fn validate_session_token(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Token and render time of the form as currently shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSession {
    /// 64 lowercase hex digits.
    pub token: String,
    /// When the form became interactive. Starts the dwell timer.
    pub rendered_at: DateTime<Utc>,
}

impl FormSession {
    /// Fresh session rendered at `now`.
    pub fn new(random: &dyn RandomBytesSource, now: DateTime<Utc>) -> Self {
        Self {
            token: generate_session_token(random),
            rendered_at: now,
        }
    }

    /// Leading characters of the token, safe to forward with a message.
    pub fn token_prefix(&self, len: usize) -> &str {
        self.token.get(..len).unwrap_or(&self.token)
    }
}

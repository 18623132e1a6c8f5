//! Identifier types.
//!
//! A [`SessionId`] names a transport connection and changes on every
//! reconnect. A [`PlayerId`] names a seat in a room and never changes while
//! the player holds it. Rooms are addressed by a short human-typeable
//! [`RoomCode`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ProtoError;

/// Number of characters in a room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Symbols a room code is drawn from.
pub const ROOM_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Transport-level connection identifier.
///
/// Rendered on the wire as 16 lowercase hex characters so JavaScript clients
/// never lose precision on the 64-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw connection id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw connection id.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ProtoError::InvalidSessionId(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ProtoError::InvalidSessionId(s.to_string()))
    }
}

impl TryFrom<String> for SessionId {
    type Error = ProtoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.to_string()
    }
}

/// Stable per-room player identity, allocated on join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Six-character room code from `[A-Z0-9]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse user input into a room code.
    ///
    /// Surrounding whitespace is ignored and lowercase letters are accepted,
    /// so `" abc123 "` parses to `ABC123`.
    pub fn parse(input: &str) -> Result<Self, ProtoError> {
        let code = input.trim().to_ascii_uppercase();
        let valid = code.len() == ROOM_CODE_LEN
            && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b));
        if valid { Ok(Self(code)) } else { Err(ProtoError::InvalidRoomCode(input.to_string())) }
    }

    /// Draw a code from a source of random words.
    ///
    /// Each symbol is `next() % 36`; the modulo bias over a 64-bit word is
    /// negligible for this alphabet.
    pub fn generate(mut next: impl FnMut() -> u64) -> Self {
        let len = ROOM_CODE_ALPHABET.len() as u64;
        let code = (0..ROOM_CODE_LEN)
            .map(|_| {
                #[allow(clippy::cast_possible_truncation)]
                let index = (next() % len) as usize;
                char::from(ROOM_CODE_ALPHABET[index])
            })
            .collect();
        Self(code)
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

//! Protocol error types.

use thiserror::Error;

/// Errors produced while parsing identifiers or decoding events.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// The JSON did not match any known event shape.
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A line exceeded [`crate::MAX_LINE_BYTES`].
    #[error("event too large: {size} bytes (max {max})")]
    TooLarge {
        /// Size of the rejected line in bytes.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A room code was not 6 characters from `[A-Z0-9]`.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),

    /// A session id was not 16 hex characters.
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),
}

//! Lobby payload types: roster entries, room errors, full-state snapshots.

use serde::{Deserialize, Serialize};

use crate::{GameSnapshot, PlayerId};

/// Maximum number of players in one room.
pub const MAX_PLAYERS: usize = 8;

/// Player colours, indexed by [`Player::color`].
pub const PLAYER_PALETTE: [&str; 8] =
    ["#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEEAD", "#D4A5A5", "#9B59B6", "#3498DB"];

/// Roster entry as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Stable player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Index into [`PLAYER_PALETTE`].
    pub color: u8,
    /// Whether this player is the current host.
    ///
    /// Always recomputed from the room's host id when a roster is built.
    pub is_host: bool,
}

/// Reasons a room request is rejected.
///
/// Rejections are sent only to the client that caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomErrorKind {
    /// The connection is already seated in a room.
    AlreadyInRoom,
    /// No live room has the given code.
    RoomNotFound,
    /// The room already holds [`MAX_PLAYERS`] players.
    RoomFull,
    /// Rejoin named a session the room does not know.
    PlayerNotFound,
    /// Only the host may start a game.
    NotHost,
}

impl RoomErrorKind {
    /// Default human-readable message.
    pub const fn message(self) -> &'static str {
        match self {
            Self::AlreadyInRoom => "already in a room",
            Self::RoomNotFound => "room not found",
            Self::RoomFull => "room is full",
            Self::PlayerNotFound => "player not found",
            Self::NotHost => "only the host can start a game",
        }
    }
}

/// Full room snapshot (`gameState`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Roster in join order.
    pub players: Vec<Player>,
    /// Current game, if one was ever started in this room.
    pub current_game: Option<GameSnapshot>,
    /// Whether a game exists.
    pub game_started: bool,
}

impl GameState {
    /// The roster entry flagged as host, if any.
    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }
}

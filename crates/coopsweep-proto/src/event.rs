//! Client and server event vocabularies.
//!
//! Both enums are adjacently tagged: the variant name (camelCase) goes in
//! `event` and the fields in `data`. Unit variants omit `data`.

use serde::{Deserialize, Serialize};

use crate::{
    Difficulty, GameDimensions, GameState, Player, PlayerId, RevealedCell, RoomCode,
    RoomErrorKind, SessionId,
};

/// Events sent from a client to the server.
///
/// Room codes and session ids arrive as plain strings; the server parses them
/// so that a bad code becomes a `RoomNotFound` rejection rather than a dropped
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Create a room and become its host.
    CreateRoom {
        /// Display name.
        name: String,
    },
    /// Join an existing room.
    JoinRoom {
        /// Display name.
        name: String,
        /// Code of the room to join.
        room_code: String,
    },
    /// Reclaim a seat held by a previous connection.
    RejoinRoom {
        /// Code of the room.
        room_code: String,
        /// Session id of the previous connection.
        old_id: String,
    },
    /// Leave the current room.
    LeaveRoom,
    /// Start a new game (host only).
    NewGame {
        /// Preset for the new board.
        #[serde(default)]
        difficulty: Difficulty,
    },
    /// Reveal a cell.
    RevealCell {
        /// Row index.
        row: i64,
        /// Column index.
        col: i64,
    },
    /// Toggle the flag on a cell.
    ToggleFlag {
        /// Row index.
        row: i64,
        /// Column index.
        col: i64,
    },
    /// Send a chat line to the room.
    ChatMessage {
        /// Message text.
        text: String,
    },
    /// Keepalive; the server answers with `pong`.
    ///
    /// Any inbound line resets the idle timer, so a client that only watches
    /// must send this more often than the server's idle timeout.
    Ping,
}

impl ClientEvent {
    /// Wire name of the event, for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::RejoinRoom { .. } => "rejoinRoom",
            Self::LeaveRoom => "leaveRoom",
            Self::NewGame { .. } => "newGame",
            Self::RevealCell { .. } => "revealCell",
            Self::ToggleFlag { .. } => "toggleFlag",
            Self::ChatMessage { .. } => "chatMessage",
            Self::Ping => "ping",
        }
    }
}

/// Events sent from the server to one or more clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// First message on every connection: the id the client must present
    /// to `rejoinRoom` after a reconnect.
    Connected {
        /// Id of this connection.
        session_id: SessionId,
    },
    /// The room was created and the sender is its host.
    RoomCreated {
        /// Code of the new room.
        room_code: RoomCode,
    },
    /// The sender is now seated in the room.
    RoomJoined {
        /// Code of the room.
        room_code: RoomCode,
    },
    /// A request from this client was rejected.
    RoomError {
        /// Rejection reason.
        kind: RoomErrorKind,
        /// Human-readable message.
        message: String,
    },
    /// Roster and (optionally) full board.
    GameState(GameState),
    /// Another player joined.
    PlayerJoined(Player),
    /// A player left the room.
    PlayerLeft {
        /// Id of the departed player.
        player_id: PlayerId,
    },
    /// A new game was started.
    GameStarted(GameDimensions),
    /// Cells revealed by one action.
    CellsRevealed {
        /// Newly revealed cells in reveal order.
        cells: Vec<RevealedCell>,
        /// Player who acted.
        player_id: PlayerId,
    },
    /// A flag was placed or removed.
    FlagToggled {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// New flag state.
        flagged: bool,
        /// Player who acted.
        player_id: PlayerId,
    },
    /// The game ended.
    GameOver {
        /// `true` if every safe cell was revealed.
        won: bool,
    },
    /// A chat line.
    ChatMessage {
        /// Sender's current roster entry.
        player: Player,
        /// Message text.
        message: String,
        /// Server time in Unix milliseconds.
        timestamp: u64,
    },
    /// Reply to `ping`, sent to the pinging client only.
    Pong,
}

impl ServerEvent {
    /// Build a rejection with the default message for `kind`.
    pub fn room_error(kind: RoomErrorKind) -> Self {
        Self::RoomError { kind, message: kind.message().to_string() }
    }

    /// Wire name of the event, for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::RoomCreated { .. } => "roomCreated",
            Self::RoomJoined { .. } => "roomJoined",
            Self::RoomError { .. } => "roomError",
            Self::GameState(_) => "gameState",
            Self::PlayerJoined(_) => "playerJoined",
            Self::PlayerLeft { .. } => "playerLeft",
            Self::GameStarted(_) => "gameStarted",
            Self::CellsRevealed { .. } => "cellsRevealed",
            Self::FlagToggled { .. } => "flagToggled",
            Self::GameOver { .. } => "gameOver",
            Self::ChatMessage { .. } => "chatMessage",
            Self::Pong => "pong",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn client_event_uses_camel_case_tag_and_fields() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "joinRoom",
            "data": { "name": "ann", "roomCode": "ABC123" }
        }))
        .unwrap();
        assert_eq!(event, ClientEvent::JoinRoom { name: "ann".into(), room_code: "ABC123".into() });
    }

    #[test]
    fn unit_variant_needs_no_data() {
        let event: ClientEvent = serde_json::from_value(json!({ "event": "leaveRoom" })).unwrap();
        assert_eq!(event, ClientEvent::LeaveRoom);
    }

    #[test]
    fn keepalive_events_are_bare_tags() {
        let ping: ClientEvent = serde_json::from_value(json!({ "event": "ping" })).unwrap();
        assert_eq!(ping, ClientEvent::Ping);
        assert_eq!(serde_json::to_value(ServerEvent::Pong).unwrap(), json!({ "event": "pong" }));
    }

    #[test]
    fn new_game_defaults_to_beginner() {
        let event: ClientEvent =
            serde_json::from_value(json!({ "event": "newGame", "data": {} })).unwrap();
        assert_eq!(event, ClientEvent::NewGame { difficulty: Difficulty::Beginner });
    }

    #[test]
    fn negative_coordinates_still_decode() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "revealCell",
            "data": { "row": -1, "col": 3 }
        }))
        .unwrap();
        assert_eq!(event, ClientEvent::RevealCell { row: -1, col: 3 });
    }

    #[test]
    fn player_joined_carries_player_as_data() {
        let player = Player { id: PlayerId(2), name: "bo".into(), color: 1, is_host: false };
        let json = serde_json::to_value(ServerEvent::PlayerJoined(player)).unwrap();
        assert_eq!(json["event"], "playerJoined");
        assert_eq!(json["data"]["name"], "bo");
    }

    #[test]
    fn flag_toggled_fields_are_camel_case() {
        let event =
            ServerEvent::FlagToggled { row: 1, col: 2, flagged: true, player_id: PlayerId(7) };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"]["playerId"], 7);
        assert_eq!(event.name(), "flagToggled");
    }

    #[test]
    fn room_error_uses_default_message() {
        let event = ServerEvent::room_error(RoomErrorKind::NotHost);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"]["kind"], "NotHost");
        assert_eq!(json["data"]["message"], "only the host can start a game");
    }
}

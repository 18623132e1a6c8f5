//! Room
//!
//! Authoritative state for one room: the roster, the host, and the active
//! game.
//!
//! ## Responsibilities
//!
//! - Roster: join, leave, rejoin, and the disconnect grace window
//! - Host: exactly one host while the roster is non-empty, migrating to the
//!   longest-tenured player when the host leaves
//! - Game: reveal and flag are delegated to `BoardEngine`
//! - Action generation: every method returns `RoomAction`s for the room
//!   actor to execute
//!
//! ## Design
//!
//! - No I/O and no awaiting: the room is a plain state machine, so tests
//!   drive it directly
//! - Stable identity: players are keyed by `PlayerId`; sessions only map
//!   onto them, so a rejoin re-keys one map entry and host status follows
//! - Silent no-ops: gameplay actions that cannot apply produce no actions

use std::{collections::HashMap, time::Duration};

use coopsweep_core::BoardEngine;
use coopsweep_proto::{
    Difficulty, GameDimensions, GameState, MAX_PLAYERS, PLAYER_PALETTE, Player, PlayerId,
    RevealedCell, RoomCode, RoomErrorKind, ServerEvent, SessionId,
};

/// Longest display name, in characters.
pub const MAX_NAME_CHARS: usize = 24;

/// Longest chat message, in characters.
pub const MAX_CHAT_CHARS: usize = 500;

/// Name given to players who send an empty one.
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// Per-room limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    /// Roster capacity.
    pub max_players: usize,
    /// How long a disconnected player keeps their seat. Zero disables the
    /// grace window.
    pub reconnect_grace: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { max_players: MAX_PLAYERS, reconnect_grace: Duration::from_secs(10) }
    }
}

/// Lifecycle of the room's game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// No game has been started yet.
    Lobby,
    /// A game is being played.
    InProgress,
    /// The last game ended; its board is kept until the next `newGame`.
    Ended,
}

/// Actions returned by `Room` for the room actor to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomAction {
    /// Add a session to the room topic
    Subscribe {
        /// Session to subscribe
        session: SessionId,
    },

    /// Remove a session from the room topic
    Unsubscribe {
        /// Session to unsubscribe
        session: SessionId,
    },

    /// Send an event to one session
    SendTo {
        /// Recipient
        session: SessionId,
        /// Event to send
        event: ServerEvent,
    },

    /// Send an event to every subscribed session
    Broadcast {
        /// Event to broadcast
        event: ServerEvent,
        /// Session to skip, usually the one that triggered the broadcast
        exclude: Option<SessionId>,
    },

    /// Deliver `RoomCommand::Expire` for this session after a delay
    ScheduleExpiry {
        /// Disconnected session
        session: SessionId,
        /// Delay before expiry
        after: Duration,
    },

    /// The roster is empty; the room should be removed
    Close,
}

/// Errors from `Room` operations.
///
/// Each maps onto a `roomError` kind sent to the initiating client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The session already holds a seat
    #[error("session {0} is already in a room")]
    AlreadyInRoom(SessionId),

    /// No live room has this code
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// The roster is at capacity
    #[error("room is full ({max} players)")]
    RoomFull {
        /// Roster capacity
        max: usize,
    },

    /// The room has no player for this session
    #[error("no player for session {0}")]
    PlayerNotFound(String),

    /// Only the host may start a game
    #[error("player {0} is not the host")]
    NotHost(PlayerId),
}

impl RoomError {
    /// The wire kind for this error.
    pub const fn kind(&self) -> RoomErrorKind {
        match self {
            Self::AlreadyInRoom(_) => RoomErrorKind::AlreadyInRoom,
            Self::RoomNotFound(_) => RoomErrorKind::RoomNotFound,
            Self::RoomFull { .. } => RoomErrorKind::RoomFull,
            Self::PlayerNotFound(_) => RoomErrorKind::PlayerNotFound,
            Self::NotHost(_) => RoomErrorKind::NotHost,
        }
    }

    /// The `roomError` event for this error.
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::room_error(self.kind())
    }
}

#[derive(Debug, Clone)]
struct Seat {
    id: PlayerId,
    session: SessionId,
    name: String,
    color: u8,
    connected: bool,
}

/// Authoritative state of one room.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    config: RoomConfig,
    /// Join order; index 0 is the longest-tenured player.
    seats: Vec<Seat>,
    sessions: HashMap<SessionId, PlayerId>,
    host: Option<PlayerId>,
    next_player_id: u32,
    joins: usize,
    game: Option<BoardEngine>,
}

impl Room {
    /// Create an empty room.
    pub fn new(code: RoomCode, config: RoomConfig) -> Self {
        Self {
            code,
            config,
            seats: Vec::new(),
            sessions: HashMap::new(),
            host: None,
            next_player_id: 0,
            joins: 0,
            game: None,
        }
    }

    /// Seat the creator of the room, who becomes host.
    ///
    /// Same as `join` except the creator is greeted with `roomCreated`.
    ///
    /// # Errors
    ///
    /// Same as `join`.
    pub fn create(&mut self, session: SessionId, name: &str) -> Result<Vec<RoomAction>, RoomError> {
        let greeting = ServerEvent::RoomCreated { room_code: self.code.clone() };
        self.admit(session, name, greeting)
    }

    /// Seat a new player.
    ///
    /// The joiner receives `roomJoined` and a full `gameState`; everyone else
    /// receives the updated roster and `playerJoined`.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::AlreadyInRoom` if the session holds a seat.
    /// Returns `RoomError::RoomFull` if the roster is at capacity.
    pub fn join(&mut self, session: SessionId, name: &str) -> Result<Vec<RoomAction>, RoomError> {
        let greeting = ServerEvent::RoomJoined { room_code: self.code.clone() };
        self.admit(session, name, greeting)
    }

    fn admit(
        &mut self,
        session: SessionId,
        name: &str,
        greeting: ServerEvent,
    ) -> Result<Vec<RoomAction>, RoomError> {
        if self.sessions.contains_key(&session) {
            return Err(RoomError::AlreadyInRoom(session));
        }
        if self.seats.len() >= self.config.max_players {
            return Err(RoomError::RoomFull { max: self.config.max_players });
        }

        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        let color = palette_slot(self.joins);
        self.joins += 1;

        if self.host.is_none() {
            self.host = Some(id);
        }
        let seat = Seat { id, session, name: sanitize_name(name), color, connected: true };
        let player = self.player_view(&seat);
        self.seats.push(seat);
        self.sessions.insert(session, id);

        tracing::info!(
            room = %self.code,
            %session,
            player = %id,
            players = self.seats.len(),
            "player joined"
        );

        Ok(vec![
            RoomAction::Subscribe { session },
            RoomAction::SendTo { session, event: greeting },
            RoomAction::SendTo { session, event: ServerEvent::GameState(self.game_state(true)) },
            RoomAction::Broadcast {
                event: ServerEvent::GameState(self.game_state(false)),
                exclude: Some(session),
            },
            RoomAction::Broadcast { event: ServerEvent::PlayerJoined(player), exclude: Some(session) },
        ])
    }

    /// Start a new game, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::PlayerNotFound` if the session has no seat.
    /// Returns `RoomError::NotHost` if the player is not the host.
    pub fn start_game(
        &mut self,
        session: SessionId,
        difficulty: Difficulty,
        seed: u64,
    ) -> Result<Vec<RoomAction>, RoomError> {
        let id = self
            .player_id(session)
            .ok_or_else(|| RoomError::PlayerNotFound(session.to_string()))?;
        if self.host != Some(id) {
            return Err(RoomError::NotHost(id));
        }

        let engine = BoardEngine::with_seed(difficulty, seed);
        let dimensions =
            GameDimensions { rows: engine.rows(), cols: engine.cols(), mines: engine.mine_count() };
        self.game = Some(engine);

        tracing::info!(room = %self.code, host = %id, %difficulty, "game started");

        Ok(vec![
            RoomAction::Broadcast { event: ServerEvent::GameStarted(dimensions), exclude: None },
            RoomAction::Broadcast {
                event: ServerEvent::GameState(self.game_state(true)),
                exclude: None,
            },
        ])
    }

    /// Reveal a cell for the session's player.
    ///
    /// When the reveal ends the game, `gameOver` is followed by a full
    /// `gameState` that discloses the board.
    pub fn reveal(&mut self, session: SessionId, row: i64, col: i64) -> Vec<RoomAction> {
        let Some(player) = self.player_id(session) else { return Vec::new() };
        let (Ok(row), Ok(col)) = (usize::try_from(row), usize::try_from(col)) else {
            return Vec::new();
        };
        let Some(game) = self.game.as_mut() else { return Vec::new() };
        let Some(outcome) = game.reveal_cell(row, col, player) else { return Vec::new() };

        let cells = outcome
            .cells
            .iter()
            .map(|&(row, col, cell)| RevealedCell { row, col, cell: cell.view(false) })
            .collect();
        let mut actions = vec![RoomAction::Broadcast {
            event: ServerEvent::CellsRevealed { cells, player_id: player },
            exclude: None,
        }];

        if game.is_game_over() {
            let won = game.is_won();
            tracing::info!(room = %self.code, %player, won, "game over");
            actions.push(RoomAction::Broadcast { event: ServerEvent::GameOver { won }, exclude: None });
            actions.push(RoomAction::Broadcast {
                event: ServerEvent::GameState(self.game_state(true)),
                exclude: None,
            });
        }
        actions
    }

    /// Toggle a flag for the session's player.
    pub fn toggle_flag(&mut self, session: SessionId, row: i64, col: i64) -> Vec<RoomAction> {
        let Some(player) = self.player_id(session) else { return Vec::new() };
        let (Ok(row), Ok(col)) = (usize::try_from(row), usize::try_from(col)) else {
            return Vec::new();
        };
        let Some(game) = self.game.as_mut() else { return Vec::new() };
        let Some(flag) = game.toggle_flag(row, col, player) else { return Vec::new() };

        vec![RoomAction::Broadcast {
            event: ServerEvent::FlagToggled {
                row: flag.row,
                col: flag.col,
                flagged: flag.flagged,
                player_id: player,
            },
            exclude: None,
        }]
    }

    /// Relay a chat message from the session's player.
    ///
    /// Text is trimmed and truncated; empty messages are dropped.
    pub fn chat(&self, session: SessionId, text: &str, timestamp: u64) -> Vec<RoomAction> {
        let Some(seat) = self.seat_for(session) else { return Vec::new() };
        let message = truncate_chars(text.trim(), MAX_CHAT_CHARS);
        if message.is_empty() {
            return Vec::new();
        }

        vec![RoomAction::Broadcast {
            event: ServerEvent::ChatMessage { player: self.player_view(seat), message, timestamp },
            exclude: None,
        }]
    }

    /// Remove the session's player from the room.
    ///
    /// If the host leaves and players remain, the longest-tenured connected
    /// player becomes host and the roster is rebroadcast. When every
    /// remaining player is inside their grace window, the longest-tenured
    /// one is promoted anyway. If the roster empties, the room asks to be
    /// closed.
    pub fn leave(&mut self, session: SessionId) -> Vec<RoomAction> {
        let Some(id) = self.sessions.remove(&session) else { return Vec::new() };
        self.seats.retain(|seat| seat.id != id);

        tracing::info!(room = %self.code, %session, player = %id, players = self.seats.len(), "player left");

        let mut actions = vec![
            RoomAction::Unsubscribe { session },
            RoomAction::Broadcast { event: ServerEvent::PlayerLeft { player_id: id }, exclude: None },
        ];

        if self.host == Some(id) {
            self.host = self
                .seats
                .iter()
                .find(|seat| seat.connected)
                .or_else(|| self.seats.first())
                .map(|seat| seat.id);
            if let Some(new_host) = self.host {
                tracing::info!(room = %self.code, from = %id, to = %new_host, "host migrated");
                actions.push(RoomAction::Broadcast {
                    event: ServerEvent::GameState(self.game_state(false)),
                    exclude: None,
                });
            }
        }

        if self.seats.is_empty() {
            actions.push(RoomAction::Close);
        }
        actions
    }

    /// Handle a transport disconnect.
    ///
    /// With a grace window the player keeps their seat (and host role) and
    /// an expiry is scheduled; without one this is `leave`.
    pub fn disconnect(&mut self, session: SessionId) -> Vec<RoomAction> {
        let grace = self.config.reconnect_grace;
        if grace.is_zero() {
            return self.leave(session);
        }

        let Some(id) = self.player_id(session) else { return Vec::new() };
        if let Some(seat) = self.seats.iter_mut().find(|seat| seat.id == id) {
            seat.connected = false;
        }

        tracing::debug!(room = %self.code, %session, player = %id, ?grace, "player disconnected");

        vec![
            RoomAction::Unsubscribe { session },
            RoomAction::ScheduleExpiry { session, after: grace },
        ]
    }

    /// Grace window elapsed for a disconnected session.
    ///
    /// No-op if the player rejoined under a new session or already left.
    pub fn expire(&mut self, session: SessionId) -> Vec<RoomAction> {
        match self.seat_for(session) {
            Some(seat) if !seat.connected => {
                tracing::debug!(room = %self.code, %session, "reconnect grace expired");
                self.leave(session)
            },
            _ => Vec::new(),
        }
    }

    /// Move a player from `old_id` onto `session`.
    ///
    /// The player keeps their id, colour and host role. Only the new session
    /// receives `roomJoined` and a full `gameState`. If the old session was
    /// still connected it is told with `playerLeft` that it lost the seat.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::PlayerNotFound` if `old_id` is malformed or has no
    /// seat here.
    /// Returns `RoomError::AlreadyInRoom` if `session` already holds a
    /// different seat.
    pub fn rejoin(&mut self, old_id: &str, session: SessionId) -> Result<Vec<RoomAction>, RoomError> {
        let old = old_id
            .parse::<SessionId>()
            .map_err(|_| RoomError::PlayerNotFound(old_id.to_string()))?;
        let id =
            self.player_id(old).ok_or_else(|| RoomError::PlayerNotFound(old_id.to_string()))?;
        if old != session && self.sessions.contains_key(&session) {
            return Err(RoomError::AlreadyInRoom(session));
        }

        self.sessions.remove(&old);
        self.sessions.insert(session, id);
        let mut displaced = false;
        if let Some(seat) = self.seats.iter_mut().find(|seat| seat.id == id) {
            displaced = seat.connected && old != session;
            seat.session = session;
            seat.connected = true;
        }

        tracing::info!(room = %self.code, %old, new = %session, player = %id, displaced, "player rejoined");

        let mut actions = vec![RoomAction::Unsubscribe { session: old }];
        if displaced {
            actions.push(RoomAction::SendTo {
                session: old,
                event: ServerEvent::PlayerLeft { player_id: id },
            });
        }
        actions.extend([
            RoomAction::Subscribe { session },
            RoomAction::SendTo {
                session,
                event: ServerEvent::RoomJoined { room_code: self.code.clone() },
            },
            RoomAction::SendTo { session, event: ServerEvent::GameState(self.game_state(true)) },
        ]);
        Ok(actions)
    }

    /// Roster in join order with `isHost` recomputed.
    pub fn roster(&self) -> Vec<Player> {
        self.seats.iter().map(|seat| self.player_view(seat)).collect()
    }

    /// `gameState` payload. `with_board` selects a full snapshot.
    pub fn game_state(&self, with_board: bool) -> GameState {
        GameState {
            players: self.roster(),
            current_game: self.game.as_ref().map(|game| game.snapshot(with_board)),
            game_started: self.game.is_some(),
        }
    }

    /// Room code.
    pub const fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Current host, `None` only when the room is empty.
    pub const fn host(&self) -> Option<PlayerId> {
        self.host
    }

    /// Player seated under `session`.
    pub fn player_id(&self, session: SessionId) -> Option<PlayerId> {
        self.sessions.get(&session).copied()
    }

    /// Session currently attached to `player`.
    pub fn session_of(&self, player: PlayerId) -> Option<SessionId> {
        self.seats.iter().find(|seat| seat.id == player).map(|seat| seat.session)
    }

    /// Whether the player seated under `session` is connected.
    pub fn is_connected(&self, session: SessionId) -> Option<bool> {
        self.seat_for(session).map(|seat| seat.connected)
    }

    /// Number of seated players, connected or not.
    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Lifecycle state derived from the current game.
    pub fn state(&self) -> RoomState {
        match &self.game {
            None => RoomState::Lobby,
            Some(game) if game.is_game_over() => RoomState::Ended,
            Some(_) => RoomState::InProgress,
        }
    }

    /// Active or last game.
    pub const fn game(&self) -> Option<&BoardEngine> {
        self.game.as_ref()
    }

    fn seat_for(&self, session: SessionId) -> Option<&Seat> {
        let id = self.player_id(session)?;
        self.seats.iter().find(|seat| seat.id == id)
    }

    fn player_view(&self, seat: &Seat) -> Player {
        Player {
            id: seat.id,
            name: seat.name.clone(),
            color: seat.color,
            is_host: self.host == Some(seat.id),
        }
    }
}

fn palette_slot(joins: usize) -> u8 {
    u8::try_from(joins % PLAYER_PALETTE.len()).unwrap_or(0)
}

/// Trim and truncate a display name, falling back to `"Player"`.
pub fn sanitize_name(name: &str) -> String {
    let name = truncate_chars(name.trim(), MAX_NAME_CHARS);
    if name.is_empty() { DEFAULT_PLAYER_NAME.to_string() } else { name }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

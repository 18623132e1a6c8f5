//! Per-connection gateway.
//!
//! A `Connection` tracks which room its session sits in and routes decoded
//! client events to that room's actor. Lobby requests are validated here;
//! everything else is the room's business.

use coopsweep_core::Environment;
use coopsweep_proto::{ClientEvent, RoomCode, ServerEvent, SessionId};

use crate::{
    actor::{RoomCommand, RoomHandle},
    channel::EventChannel,
    registry::RoomRegistry,
    room::RoomError,
};

/// Routing state for one connected session.
///
/// Dropping a connection that is still in a room reports a disconnect to
/// that room.
pub struct Connection<E, C>
where
    E: Environment,
    C: EventChannel,
{
    session: SessionId,
    registry: RoomRegistry<E, C>,
    room: Option<RoomHandle>,
}

impl<E, C> Connection<E, C>
where
    E: Environment,
    C: EventChannel,
{
    /// Create a connection that is not in any room.
    pub fn new(session: SessionId, registry: RoomRegistry<E, C>) -> Self {
        Self { session, registry, room: None }
    }

    /// Session id of this connection.
    pub const fn session(&self) -> SessionId {
        self.session
    }

    /// Code of the room this connection is in.
    pub fn room_code(&self) -> Option<&RoomCode> {
        self.room.as_ref().map(RoomHandle::code)
    }

    /// Route one client event.
    pub async fn handle(&mut self, event: ClientEvent) {
        tracing::trace!(session = %self.session, event = event.name(), "client event");

        match event {
            ClientEvent::CreateRoom { name } => self.create_room(&name).await,

            ClientEvent::JoinRoom { name, room_code } => self.join_room(name, &room_code).await,

            ClientEvent::RejoinRoom { room_code, old_id } => {
                self.rejoin_room(&room_code, old_id).await;
            },

            ClientEvent::LeaveRoom => {
                if let Some(room) = self.room.take() {
                    let _ = room.send(RoomCommand::Leave { session: self.session });
                }
            },

            ClientEvent::NewGame { difficulty } => {
                self.forward(RoomCommand::NewGame { session: self.session, difficulty });
            },

            ClientEvent::RevealCell { row, col } => {
                self.forward(RoomCommand::Reveal { session: self.session, row, col });
            },

            ClientEvent::ToggleFlag { row, col } => {
                self.forward(RoomCommand::Flag { session: self.session, row, col });
            },

            ClientEvent::ChatMessage { text } => {
                self.forward(RoomCommand::Chat { session: self.session, text });
            },

            ClientEvent::Ping => {
                self.registry.channel().emit_to_one(self.session, ServerEvent::Pong);
            },
        }
    }

    /// Report a transport disconnect to the current room.
    pub fn disconnect(mut self) {
        if let Some(room) = self.room.take() {
            tracing::debug!(session = %self.session, room = %room.code(), "connection closed");
            let _ = room.send(RoomCommand::Disconnect { session: self.session });
        }
    }

    async fn create_room(&mut self, name: &str) {
        let result = match self.ensure_lobby().await {
            Ok(()) => self.registry.create_room(self.session, name),
            Err(err) => Err(err),
        };
        match result {
            Ok(room) => self.room = Some(room),
            Err(err) => self.reject(&err),
        }
    }

    async fn join_room(&mut self, name: String, room_code: &str) {
        let result = match self.ensure_lobby().await.and_then(|()| self.lookup(room_code)) {
            Ok(room) => room.join(self.session, name).await.map(|()| room),
            Err(err) => Err(err),
        };
        match result {
            Ok(room) => self.room = Some(room),
            Err(err) => self.reject(&err),
        }
    }

    async fn rejoin_room(&mut self, room_code: &str, old_id: String) {
        let result = match self.ensure_lobby().await.and_then(|()| self.lookup(room_code)) {
            Ok(room) => room.rejoin(old_id, self.session).await.map(|()| room),
            Err(err) => Err(err),
        };
        match result {
            Ok(room) => self.room = Some(room),
            Err(err) => self.reject(&err),
        }
    }

    /// Fail if this session still holds a seat.
    ///
    /// A seat taken over by a rejoin from another connection no longer
    /// counts; the stale room is forgotten.
    async fn ensure_lobby(&mut self) -> Result<(), RoomError> {
        let Some(room) = &self.room else { return Ok(()) };
        if room.is_seated(self.session).await {
            return Err(RoomError::AlreadyInRoom(self.session));
        }
        tracing::debug!(session = %self.session, room = %room.code(), "seat no longer held");
        self.room = None;
        Ok(())
    }

    fn lookup(&self, room_code: &str) -> Result<RoomHandle, RoomError> {
        RoomCode::parse(room_code)
            .ok()
            .and_then(|code| self.registry.get_room(&code))
            .ok_or_else(|| RoomError::RoomNotFound(room_code.to_string()))
    }

    fn forward(&mut self, command: RoomCommand) {
        let Some(room) = &self.room else {
            tracing::trace!(session = %self.session, "not in a room, event ignored");
            return;
        };
        if room.send(command).is_err() {
            tracing::debug!(session = %self.session, room = %room.code(), "room has closed");
            self.room = None;
        }
    }

    fn reject(&self, err: &RoomError) {
        tracing::debug!(session = %self.session, error = %err, "request rejected");
        self.registry.channel().emit_to_one(self.session, err.to_event());
    }
}

impl<E, C> Drop for Connection<E, C>
where
    E: Environment,
    C: EventChannel,
{
    fn drop(&mut self) {
        if let Some(room) = self.room.take() {
            let _ = room.send(RoomCommand::Disconnect { session: self.session });
        }
    }
}

//! Room actor.
//!
//! One tokio task per room owns the `Room` and applies `RoomCommand`s
//! strictly in arrival order. Rooms never share a lock, so they run in
//! parallel; within a room, a rejoin can never interleave with a leave.

use std::time::Duration;

use coopsweep_core::Environment;
use coopsweep_proto::{Difficulty, RoomCode, SessionId};
use tokio::sync::{mpsc, oneshot};

use crate::{
    channel::EventChannel,
    executor::ActionExecutor,
    registry::RoomRegistry,
    room::{Room, RoomAction, RoomError},
};

/// Reply channel for commands whose outcome the connection needs.
pub type Reply = oneshot::Sender<Result<(), RoomError>>;

/// Commands processed by a room actor.
#[derive(Debug)]
pub enum RoomCommand {
    /// Seat a new player
    Join {
        /// Joining session
        session: SessionId,
        /// Requested display name
        name: String,
        /// Outcome of the join
        reply: Reply,
    },

    /// Move a player from a previous session onto a new one
    Rejoin {
        /// Previous session id, as sent by the client
        old_id: String,
        /// New session
        session: SessionId,
        /// Outcome of the rejoin
        reply: Reply,
    },

    /// Leave immediately
    Leave {
        /// Leaving session
        session: SessionId,
    },

    /// Transport closed; start the grace window
    Disconnect {
        /// Disconnected session
        session: SessionId,
    },

    /// Grace window elapsed
    Expire {
        /// Session whose grace window elapsed
        session: SessionId,
    },

    /// Start a new game (host only)
    NewGame {
        /// Requesting session
        session: SessionId,
        /// Preset for the new board
        difficulty: Difficulty,
    },

    /// Reveal a cell
    Reveal {
        /// Acting session
        session: SessionId,
        /// Row as sent by the client
        row: i64,
        /// Column as sent by the client
        col: i64,
    },

    /// Toggle a flag
    Flag {
        /// Acting session
        session: SessionId,
        /// Row as sent by the client
        row: i64,
        /// Column as sent by the client
        col: i64,
    },

    /// Relay a chat message
    Chat {
        /// Sending session
        session: SessionId,
        /// Raw message text
        text: String,
    },

    /// Ask whether a session still holds a seat
    Seated {
        /// Session to look up
        session: SessionId,
        /// `true` while the session maps to a player
        reply: oneshot::Sender<bool>,
    },
}

/// Sending side of a room actor's queue.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    tx: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    /// Code of the room this handle addresses.
    pub const fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Queue a command.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::RoomNotFound` if the room has closed.
    pub fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.tx.send(command).map_err(|_| self.not_found())
    }

    /// Seat `session` and wait for the outcome.
    pub async fn join(&self, session: SessionId, name: String) -> Result<(), RoomError> {
        let (reply, outcome) = oneshot::channel();
        self.send(RoomCommand::Join { session, name, reply })?;
        outcome.await.unwrap_or_else(|_| Err(self.not_found()))
    }

    /// Move the player seated under `old_id` onto `session` and wait for the
    /// outcome.
    pub async fn rejoin(&self, old_id: String, session: SessionId) -> Result<(), RoomError> {
        let (reply, outcome) = oneshot::channel();
        self.send(RoomCommand::Rejoin { old_id, session, reply })?;
        outcome.await.unwrap_or_else(|_| Err(self.not_found()))
    }

    /// Whether `session` still holds a seat.
    ///
    /// A closed room seats nobody.
    pub async fn is_seated(&self, session: SessionId) -> bool {
        let (reply, outcome) = oneshot::channel();
        if self.send(RoomCommand::Seated { session, reply }).is_err() {
            return false;
        }
        outcome.await.unwrap_or(false)
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn not_found(&self) -> RoomError {
        RoomError::RoomNotFound(self.code.to_string())
    }
}

/// Spawn the actor for `room`, executing `initial` before any command.
pub(crate) fn spawn<E, C>(room: Room, initial: Vec<RoomAction>, registry: RoomRegistry<E, C>) -> RoomHandle
where
    E: Environment,
    C: EventChannel,
{
    let (tx, commands) = mpsc::unbounded_channel();
    let handle = RoomHandle { code: room.code().clone(), tx };

    let actor = RoomActor {
        env: registry.env().clone(),
        executor: ActionExecutor::new(registry.channel().clone()),
        created_at: registry.env().now(),
        expiry_tx: handle.tx.downgrade(),
        room,
        commands,
        registry,
    };
    tokio::spawn(actor.run(initial));

    handle
}

struct RoomActor<E, C>
where
    E: Environment,
    C: EventChannel,
{
    room: Room,
    env: E,
    executor: ActionExecutor<C>,
    registry: RoomRegistry<E, C>,
    commands: mpsc::UnboundedReceiver<RoomCommand>,
    /// Weak so pending timers never keep a closed room alive.
    expiry_tx: mpsc::WeakUnboundedSender<RoomCommand>,
    created_at: std::time::Instant,
}

impl<E, C> RoomActor<E, C>
where
    E: Environment,
    C: EventChannel,
{
    async fn run(mut self, initial: Vec<RoomAction>) {
        let mut open = self.apply(initial);

        while open {
            let Some(command) = self.commands.recv().await else { break };
            let actions = self.dispatch(command);
            open = self.apply(actions);
        }

        self.commands.close();
        self.registry.remove_room(self.room.code());

        let age = self.env.now().saturating_duration_since(self.created_at);
        tracing::info!(room = %self.room.code(), age_secs = age.as_secs(), "room closed");
    }

    fn dispatch(&mut self, command: RoomCommand) -> Vec<RoomAction> {
        match command {
            RoomCommand::Join { session, name, reply } => {
                let result = self.room.join(session, &name);
                self.answer(session, result, reply)
            },

            RoomCommand::Rejoin { old_id, session, reply } => {
                let result = self.room.rejoin(&old_id, session);
                self.answer(session, result, reply)
            },

            RoomCommand::Leave { session } => self.room.leave(session),

            RoomCommand::Disconnect { session } => self.room.disconnect(session),

            RoomCommand::Expire { session } => self.room.expire(session),

            RoomCommand::NewGame { session, difficulty } => {
                let seed = self.env.random_u64();
                self.room
                    .start_game(session, difficulty, seed)
                    .unwrap_or_else(|err| self.reject(session, &err))
            },

            RoomCommand::Reveal { session, row, col } => self.room.reveal(session, row, col),

            RoomCommand::Flag { session, row, col } => self.room.toggle_flag(session, row, col),

            RoomCommand::Chat { session, text } => {
                self.room.chat(session, &text, self.env.unix_millis())
            },

            RoomCommand::Seated { session, reply } => {
                let _ = reply.send(self.room.player_id(session).is_some());
                Vec::new()
            },
        }
    }

    /// Report a join or rejoin outcome to the waiting connection.
    ///
    /// If the connection stopped waiting, the fresh seat is treated as
    /// disconnected so it cannot linger.
    fn answer(
        &mut self,
        session: SessionId,
        result: Result<Vec<RoomAction>, RoomError>,
        reply: Reply,
    ) -> Vec<RoomAction> {
        match result {
            Ok(mut actions) => {
                if reply.send(Ok(())).is_err() {
                    tracing::debug!(room = %self.room.code(), %session, "joiner went away");
                    actions.extend(self.room.disconnect(session));
                }
                actions
            },
            Err(err) => {
                tracing::debug!(room = %self.room.code(), %session, error = %err, "request rejected");
                let _ = reply.send(Err(err));
                Vec::new()
            },
        }
    }

    fn reject(&self, session: SessionId, err: &RoomError) -> Vec<RoomAction> {
        tracing::debug!(room = %self.room.code(), %session, error = %err, "request rejected");
        vec![RoomAction::SendTo { session, event: err.to_event() }]
    }

    /// Execute actions; returns `false` once the room has closed.
    fn apply(&self, actions: Vec<RoomAction>) -> bool {
        let deferred = self.executor.execute(self.room.code(), actions);
        for (session, after) in deferred.expiries {
            self.schedule_expiry(session, after);
        }
        !deferred.close
    }

    fn schedule_expiry(&self, session: SessionId, after: Duration) {
        let env = self.env.clone();
        let tx = self.expiry_tx.clone();

        tokio::spawn(async move {
            env.sleep(after).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(RoomCommand::Expire { session });
            }
        });
    }
}

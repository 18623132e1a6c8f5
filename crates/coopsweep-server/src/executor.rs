//! Action executor.
//!
//! Applies the delivery half of `RoomAction`s to an `EventChannel` and hands
//! timer and lifecycle actions back to the room actor.

use std::time::Duration;

use coopsweep_proto::{RoomCode, SessionId};

use crate::{channel::EventChannel, room::RoomAction};

/// Actions the executor cannot perform on a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deferred {
    /// Expiry timers to start, per disconnected session.
    pub expiries: Vec<(SessionId, Duration)>,
    /// Whether the room asked to be closed.
    pub close: bool,
}

/// Executes room actions against an event channel.
#[derive(Debug, Clone)]
pub struct ActionExecutor<C> {
    channel: C,
}

impl<C: EventChannel> ActionExecutor<C> {
    /// Create an executor over `channel`.
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    /// The underlying channel.
    pub const fn channel(&self) -> &C {
        &self.channel
    }

    /// Execute actions for room `code` in order.
    pub fn execute(&self, code: &RoomCode, actions: Vec<RoomAction>) -> Deferred {
        let mut deferred = Deferred::default();

        for action in actions {
            match action {
                RoomAction::Subscribe { session } => self.channel.subscribe(code, session),

                RoomAction::Unsubscribe { session } => self.channel.unsubscribe(code, session),

                RoomAction::SendTo { session, event } => {
                    tracing::trace!(room = %code, %session, event = event.name(), "send");
                    self.channel.emit_to_one(session, event);
                },

                RoomAction::Broadcast { event, exclude } => {
                    tracing::trace!(room = %code, event = event.name(), "broadcast");
                    self.channel.broadcast_to_room(code, &event, exclude);
                },

                RoomAction::ScheduleExpiry { session, after } => {
                    deferred.expiries.push((session, after));
                },

                RoomAction::Close => deferred.close = true,
            }
        }

        deferred
    }
}

//! Event channel
//!
//! Transport-agnostic pub/sub between connected sessions and their room.
//! Rooms publish to a topic named after their code; each session drains its
//! own ordered queue.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use coopsweep_proto::{RoomCode, ServerEvent, SessionId};
use tokio::sync::mpsc;

/// Delivery of server events to sessions.
///
/// Implementations must deliver events to one session in the order they
/// were emitted.
pub trait EventChannel: Clone + Send + Sync + 'static {
    /// Send an event to a single session.
    fn emit_to_one(&self, session: SessionId, event: ServerEvent);

    /// Send an event to every session subscribed to `code`, except `exclude`.
    fn broadcast_to_room(&self, code: &RoomCode, event: &ServerEvent, exclude: Option<SessionId>);

    /// Add a session to a room topic.
    fn subscribe(&self, code: &RoomCode, session: SessionId);

    /// Remove a session from a room topic.
    fn unsubscribe(&self, code: &RoomCode, session: SessionId);
}

#[derive(Debug, Default)]
struct HubState {
    queues: HashMap<SessionId, mpsc::UnboundedSender<ServerEvent>>,
    topics: HashMap<RoomCode, HashSet<SessionId>>,
}

/// In-process `EventChannel` backed by one unbounded queue per session.
#[derive(Debug, Clone, Default)]
pub struct ChannelHub {
    state: Arc<Mutex<HubState>>,
}

impl ChannelHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return the receiving end of its queue.
    ///
    /// Registering an id twice replaces the previous queue.
    pub fn register(&self, session: SessionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.lock().queues.insert(session, tx).is_some() {
            tracing::warn!(%session, "session registered twice, previous queue dropped");
        }
        rx
    }

    /// Drop a session's queue and remove it from every topic.
    pub fn unregister(&self, session: SessionId) {
        let mut state = self.lock();
        state.queues.remove(&session);
        for members in state.topics.values_mut() {
            members.remove(&session);
        }
        state.topics.retain(|_, members| !members.is_empty());
    }

    /// Number of sessions subscribed to `code`.
    pub fn subscriber_count(&self, code: &RoomCode) -> usize {
        self.lock().topics.get(code).map_or(0, HashSet::len)
    }

    /// Number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.lock().queues.len()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn deliver(
    queues: &HashMap<SessionId, mpsc::UnboundedSender<ServerEvent>>,
    session: SessionId,
    event: ServerEvent,
) {
    let name = event.name();
    match queues.get(&session) {
        Some(tx) => {
            if tx.send(event).is_err() {
                tracing::debug!(%session, event = name, "session queue closed, event dropped");
            }
        },
        None => tracing::debug!(%session, event = name, "unknown session, event dropped"),
    }
}

impl EventChannel for ChannelHub {
    fn emit_to_one(&self, session: SessionId, event: ServerEvent) {
        deliver(&self.lock().queues, session, event);
    }

    fn broadcast_to_room(&self, code: &RoomCode, event: &ServerEvent, exclude: Option<SessionId>) {
        let state = self.lock();
        let Some(members) = state.topics.get(code) else { return };
        for &session in members {
            if Some(session) != exclude {
                deliver(&state.queues, session, event.clone());
            }
        }
    }

    fn subscribe(&self, code: &RoomCode, session: SessionId) {
        self.lock().topics.entry(code.clone()).or_default().insert(session);
    }

    fn unsubscribe(&self, code: &RoomCode, session: SessionId) {
        let mut state = self.lock();
        if let Some(members) = state.topics.get_mut(code) {
            members.remove(&session);
            if members.is_empty() {
                state.topics.remove(code);
            }
        }
    }
}

//! Room registry.
//!
//! Maps room codes to live room actors. Code generation and insertion
//! happen under the same lock, so two rooms can never share a code.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use coopsweep_core::Environment;
use coopsweep_proto::{RoomCode, SessionId};

use crate::{
    actor::{self, RoomHandle},
    channel::EventChannel,
    room::{Room, RoomConfig, RoomError},
};

struct RegistryInner<E, C> {
    rooms: Mutex<HashMap<RoomCode, RoomHandle>>,
    env: E,
    channel: C,
    config: RoomConfig,
}

/// Registry of live rooms.
///
/// Cheap to clone; clones share the same rooms.
pub struct RoomRegistry<E, C> {
    inner: Arc<RegistryInner<E, C>>,
}

impl<E, C> Clone for RoomRegistry<E, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E, C> RoomRegistry<E, C>
where
    E: Environment,
    C: EventChannel,
{
    /// Create an empty registry.
    pub fn new(env: E, channel: C, config: RoomConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner { rooms: Mutex::new(HashMap::new()), env, channel, config }),
        }
    }

    /// Create a room with `session` as host and spawn its actor.
    ///
    /// The host receives `roomCreated` and a full `gameState`.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::RoomFull` only if rooms are configured with no
    /// seats.
    pub fn create_room(&self, session: SessionId, name: &str) -> Result<RoomHandle, RoomError> {
        let mut rooms = self.lock();

        let code = loop {
            let code = RoomCode::generate(|| self.inner.env.random_u64());
            if !rooms.contains_key(&code) {
                break code;
            }
            tracing::debug!(%code, "room code collision, retrying");
        };

        let mut room = Room::new(code.clone(), self.inner.config);
        let actions = room.create(session, name)?;
        let handle = actor::spawn(room, actions, self.clone());
        rooms.insert(code.clone(), handle.clone());

        tracing::info!(room = %code, %session, rooms = rooms.len(), "room created");
        Ok(handle)
    }

    /// Look up a live room.
    pub fn get_room(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.lock().get(code).cloned()
    }

    /// Remove a room. Called by the room actor once its roster is empty.
    pub fn remove_room(&self, code: &RoomCode) -> Option<RoomHandle> {
        let removed = self.lock().remove(code);
        if removed.is_some() {
            tracing::debug!(room = %code, "room removed from registry");
        }
        removed
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.lock().len()
    }

    /// Codes of live rooms, sorted.
    pub fn room_codes(&self) -> Vec<RoomCode> {
        let mut codes: Vec<_> = self.lock().keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Environment shared by all rooms.
    pub fn env(&self) -> &E {
        &self.inner.env
    }

    /// Channel shared by all rooms.
    pub fn channel(&self) -> &C {
        &self.inner.channel
    }

    /// Limits applied to new rooms.
    pub fn config(&self) -> RoomConfig {
        self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RoomCode, RoomHandle>> {
        self.inner.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E, C> std::fmt::Debug for RoomRegistry<E, C>
where
    E: Environment,
    C: EventChannel,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry").field("room_count", &self.room_count()).finish()
    }
}

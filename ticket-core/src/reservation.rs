use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use twilight_model::id::{
    Id,
    marker::{GuildMarker, UserMarker},
};

type Key = (Id<GuildMarker>, Id<UserMarker>);

/// In-flight ticket creations, keyed by (guild, user).
///
/// Closes the window between the duplicate-name check and channel creation
/// for interactions handled by this process.
#[derive(Clone, Debug, Default)]
pub struct Reservations {
    pending: Arc<Mutex<HashSet<Key>>>,
}

impl Reservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the slot for a user, or `None` if a creation is already running.
    pub fn try_reserve(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> Option<Reservation> {
        let key = (guild_id, user_id);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        pending.insert(key).then(|| Reservation {
            pending: Arc::clone(&self.pending),
            key,
        })
    }

    pub fn is_reserved(&self, guild_id: Id<GuildMarker>, user_id: Id<UserMarker>) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(guild_id, user_id))
    }
}

/// Held while a ticket channel is being created; released on drop.
#[derive(Debug)]
pub struct Reservation {
    pending: Arc<Mutex<HashSet<Key>>>,
    key: Key,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

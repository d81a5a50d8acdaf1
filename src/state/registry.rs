use crate::state::changes::{diff, ChangeSet};
use crate::state::entity::Entity;
use crate::state::snapshot::Snapshot;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Concurrent store of every host seen so far, keyed by host id.
///
/// Two lock tiers:
/// - the registry lock guards map structure (exclusive only to insert a new key)
/// - each [`Entity`] has its own lock guarding its contents
///
/// Updating an existing host therefore only holds that host's lock, and
/// unrelated hosts are updated without contention. Hosts are never removed.
#[derive(Debug, Default)]
pub struct Registry {
    entities: RwLock<HashMap<u64, Arc<Entity>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation.
    ///
    /// Returns the host's entity together with the changes caused by this
    /// call (empty when the observation matches what is already known).
    ///
    /// Concurrent first sightings of the same id: the first insert wins and
    /// later ones are applied to it as ordinary updates.
    pub fn upsert(&self, snapshot: Snapshot) -> (Arc<Entity>, ChangeSet) {
        if let Some(entity) = self.get(snapshot.host_id) {
            let changes = entity.apply(snapshot);
            return (entity, changes);
        }

        let host_id = snapshot.host_id;
        let mut entities = self
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match entities.entry(host_id) {
            Entry::Vacant(slot) => {
                let changes = diff(Some(&snapshot), None);
                let entity = Arc::new(Entity::new(snapshot));
                slot.insert(Arc::clone(&entity));
                debug!(host_id = host_id, "New host registered");
                (entity, changes)
            }
            Entry::Occupied(slot) => {
                // Lost the insert race; fall back to an update
                let entity = Arc::clone(slot.get());
                drop(entities);
                let changes = entity.apply(snapshot);
                (entity, changes)
            }
        }
    }

    /// Get host by id
    pub fn get(&self, host_id: u64) -> Option<Arc<Entity>> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&host_id)
            .cloned()
    }

    /// Point-in-time copy of the full mapping
    pub fn all(&self) -> HashMap<u64, Arc<Entity>> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

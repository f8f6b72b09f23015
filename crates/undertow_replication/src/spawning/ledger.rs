//! Spawn ledger: which identities exist locally, and as what kind.
//!
//! Entities can be spawned as one thing and later need to be respawned as
//! another. A flare held in an inventory is an `InventoryItem`; once dropped
//! it comes back as a `World` entity with the same id. The ledger therefore
//! answers "spawned *as this kind*", not just "spawned".

use crate::error::{ReplicationError, ReplicationResult};
use std::collections::HashMap;
use undertow_shared::{Entity, EntityId, Kind};

/// Identity → kind record of realized entities.
#[derive(Debug, Default)]
pub struct SpawnLedger {
    spawned_as: HashMap<EntityId, Kind>,
}

impl SpawnLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `entity.id` is recorded with exactly `entity.kind`.
    #[must_use]
    pub fn was_already_spawned(&self, entity: &Entity) -> bool {
        self.spawned_as.get(&entity.id) == Some(&entity.kind)
    }

    /// True iff any kind is recorded for `id`.
    #[must_use]
    pub fn is_known(&self, id: EntityId) -> bool {
        self.spawned_as.contains_key(&id)
    }

    /// Returns the recorded kind for `id`.
    ///
    /// # Errors
    ///
    /// [`ReplicationError::UnknownEntity`] if `id` was never marked.
    pub fn require_kind(&self, id: EntityId) -> ReplicationResult<Kind> {
        self.spawned_as
            .get(&id)
            .copied()
            .ok_or(ReplicationError::UnknownEntity(id))
    }

    /// Records `entity.id → entity.kind`, overwriting any previous kind.
    pub fn mark_spawned(&mut self, entity: &Entity) {
        self.spawned_as.insert(entity.id, entity.kind);
    }

    /// Deletes the record for `id`. Returns whether one existed.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.spawned_as.remove(&id).is_some()
    }

    /// Removes `entity` and every nested child so the hierarchy can be
    /// respawned.
    ///
    /// Only the ledger is touched. Callers must already have removed the
    /// realized objects from the world.
    pub fn remove_hierarchy(&mut self, entity: &Entity) {
        self.remove(entity.id);

        for child in &entity.child_entities {
            self.remove_hierarchy(child);
        }
    }

    /// Number of recorded identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spawned_as.len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spawned_as.is_empty()
    }

    /// Forgets everything. Used on disconnect and world unload.
    pub fn clear(&mut self) {
        self.spawned_as.clear();
    }
}

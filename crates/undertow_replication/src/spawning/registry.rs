//! Kind → spawner dispatch.
//!
//! Several kinds may point at one spawner instance. The world spawner, for
//! example, handles every world-placed kind and branches on the kind itself.

use crate::error::{ReplicationError, ReplicationResult};
use crate::integration::ObjectHandle;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use undertow_shared::{Entity, Kind};

/// Kind-specific construction strategy.
///
/// Implemented on the engine side. `spawn` may suspend for as long as the
/// engine needs; the orchestrator starts nothing else while it is pending.
#[async_trait]
pub trait Spawner: Send + Sync {
    /// True if `spawn` already creates and wires `entity.child_entities`,
    /// so the orchestrator must not recurse into them.
    fn spawns_own_children(&self, entity: &Entity) -> bool;

    /// Constructs the engine-side object.
    ///
    /// Returns `None` for entities that produce no addressable object (pure
    /// data entities such as an inventory record).
    ///
    /// # Errors
    ///
    /// Engine failures should be reported as [`ReplicationError::SpawnFailed`].
    async fn spawn(&self, entity: &Entity) -> ReplicationResult<Option<ObjectHandle>>;
}

/// The spawners the client ships with, one per construction strategy.
pub struct StandardSpawners {
    /// Prefab sub-objects.
    pub prefab_child: Arc<dyn Spawner>,
    /// Inventory containers.
    pub inventory: Arc<dyn Spawner>,
    /// Items inside inventories.
    pub inventory_item: Arc<dyn Spawner>,
    /// Every world-placed kind.
    pub world: Arc<dyn Spawner>,
}

/// Maps each [`Kind`] to its [`Spawner`].
#[derive(Default)]
pub struct SpawnerRegistry {
    spawners: HashMap<Kind, Arc<dyn Spawner>>,
}

impl SpawnerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard layout: one spawner per strategy, with every
    /// world-placed kind aliased to the world spawner.
    #[must_use]
    pub fn with_standard_layout(spawners: StandardSpawners) -> Self {
        let mut registry = Self::new();
        registry.register(Kind::PrefabChild, spawners.prefab_child);
        registry.register(Kind::Inventory, spawners.inventory);
        registry.register(Kind::InventoryItem, spawners.inventory_item);
        registry.register_shared(&Kind::WORLD_PLACED, &spawners.world);
        registry
    }

    /// Binds `kind` to `spawner`, replacing any previous binding.
    pub fn register(&mut self, kind: Kind, spawner: Arc<dyn Spawner>) {
        self.spawners.insert(kind, spawner);
    }

    /// Binds every kind in `kinds` to the same spawner instance.
    pub fn register_shared(&mut self, kinds: &[Kind], spawner: &Arc<dyn Spawner>) {
        for kind in kinds {
            self.spawners.insert(*kind, Arc::clone(spawner));
        }
    }

    /// Looks up the spawner for `kind`.
    ///
    /// # Errors
    ///
    /// [`ReplicationError::UnknownKind`] if nothing is registered. This means
    /// client and authority disagree on the protocol and must not be retried.
    pub fn get(&self, kind: Kind) -> ReplicationResult<Arc<dyn Spawner>> {
        self.spawners
            .get(&kind)
            .cloned()
            .ok_or(ReplicationError::UnknownKind(kind))
    }

    /// Returns true if `kind` has a spawner.
    #[must_use]
    pub fn contains(&self, kind: Kind) -> bool {
        self.spawners.contains_key(&kind)
    }
}

impl std::fmt::Debug for SpawnerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnerRegistry")
            .field("kinds", &self.spawners.keys().collect::<Vec<_>>())
            .finish()
    }
}

//! # Replication Client
//!
//! The one object the rest of the game client talks to.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      ENTITIES                        │
//! ├──────────────────────────────────────────────────────┤
//! │  ┌────────────────────────┐  ┌────────────────────┐  │
//! │  │ EntityOrchestrator     │  │ OutboundBroadcaster│  │
//! │  │ (behind async mutex)   │  │ (packets out)      │  │
//! │  └────────────────────────┘  └────────────────────┘  │
//! │         ▲                              │             │
//! │   batches from network          PacketSender         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Walks are serialized: a second `spawn_all` waits for the first to finish
//! before it looks at the ledger.

use crate::broadcast::OutboundBroadcaster;
use crate::config::ReplicationConfig;
use crate::error::ReplicationResult;
use crate::integration::{EngineBindings, PacketSender};
use crate::spawning::{EntityOrchestrator, SpawnStats, SpawnerRegistry};
use std::sync::Arc;
use tokio::sync::Mutex;
use undertow_shared::{Entity, EntityId, Kind};

/// Client-side entity replication.
pub struct Entities {
    orchestrator: Mutex<EntityOrchestrator>,
    broadcaster: OutboundBroadcaster,
}

impl Entities {
    /// Wires an orchestrator and a broadcaster over the same engine.
    #[must_use]
    pub fn new(
        registry: SpawnerRegistry,
        engine: EngineBindings,
        sender: Arc<dyn PacketSender>,
        config: ReplicationConfig,
    ) -> Self {
        let broadcaster = OutboundBroadcaster::new(
            sender,
            Arc::clone(&engine.live_objects),
            Arc::clone(&engine.metadata),
        );

        Self {
            orchestrator: Mutex::new(EntityOrchestrator::new(registry, engine, config)),
            broadcaster,
        }
    }

    /// Realizes a batch received from the authority.
    ///
    /// # Errors
    ///
    /// See [`EntityOrchestrator::spawn_all`].
    pub async fn spawn_all(&self, entities: Vec<Entity>) -> ReplicationResult<()> {
        self.orchestrator.lock().await.spawn_all(entities).await
    }

    /// True iff `entity` is recorded with exactly its kind.
    pub async fn was_already_spawned(&self, entity: &Entity) -> bool {
        self.orchestrator.lock().await.was_already_spawned(entity)
    }

    /// True iff `id` has been realized as any kind.
    pub async fn is_known(&self, id: EntityId) -> bool {
        self.orchestrator.lock().await.is_known(id)
    }

    /// Kind `id` was realized as.
    ///
    /// # Errors
    ///
    /// [`ReplicationError::UnknownEntity`](crate::ReplicationError::UnknownEntity)
    /// if `id` was never realized.
    pub async fn require_kind(&self, id: EntityId) -> ReplicationResult<Kind> {
        self.orchestrator.lock().await.require_kind(id)
    }

    /// Forgets `id` after it was destroyed locally.
    pub async fn remove_entity(&self, id: EntityId) -> bool {
        self.orchestrator.lock().await.remove_entity(id)
    }

    /// Forgets `entity` and its nested children.
    pub async fn remove_hierarchy(&self, entity: &Entity) {
        self.orchestrator.lock().await.remove_hierarchy(entity);
    }

    /// Announces an entity the client spawned itself and records it, so a
    /// later echo from the authority is not constructed twice.
    ///
    /// # Errors
    ///
    /// [`ReplicationError::NotWorldPlaced`](crate::ReplicationError::NotWorldPlaced)
    /// before anything is recorded, then transport and release failures.
    pub async fn spawned_by_client(&self, entity: &Entity) -> ReplicationResult<()> {
        let mut orchestrator = self.orchestrator.lock().await;
        self.broadcaster.broadcast_client_spawn(entity)?;
        orchestrator.adopt(entity).await
    }

    /// Drops all replication state (disconnect, world unload).
    pub async fn clear(&self) {
        self.orchestrator.lock().await.clear();
    }

    /// Orchestrator counters.
    pub async fn stats(&self) -> SpawnStats {
        self.orchestrator.lock().await.stats()
    }

    /// Outgoing packet side.
    #[must_use]
    pub const fn broadcaster(&self) -> &OutboundBroadcaster {
        &self.broadcaster
    }
}

impl std::fmt::Debug for Entities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entities").finish_non_exhaustive()
    }
}

//! # Entity Orchestrator
//!
//! Walks batches of entity descriptions and realizes them in dependency order.
//!
//! ## Per-entity decision
//!
//! ```text
//! already spawned as this kind? ── yes ──> move it (world kinds only)
//!            │ no
//! parent unknown to the ledger? ── yes ──> park in the pending queue
//!            │ no
//!            ▼
//!          spawn
//! ```
//!
//! ## spawn
//!
//! ```text
//! mark ─> construct ─> children ─> release parked children ─> ready? ─> metadata
//! ```
//!
//! Marking happens before construction so a spawner that looks the entity up
//! re-entrantly never triggers a second construction. Metadata comes last so
//! processors can rely on children existing (equipment needs its items).
//!
//! Only one construction is ever in flight. The walk takes `&mut self`, and
//! the [`Entities`](crate::client::Entities) facade serializes walks behind an
//! async mutex.

use crate::config::{ReadinessTimeoutAction, ReplicationConfig};
use crate::error::{ReplicationError, ReplicationResult};
use crate::integration::{EngineBindings, ObjectHandle};
use crate::spawning::ledger::SpawnLedger;
use crate::spawning::pending::PendingDependencyQueue;
use crate::spawning::readiness::{wait_until_ready, Readiness};
use crate::spawning::registry::SpawnerRegistry;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use undertow_shared::{Entity, EntityId, Kind};

/// Boxed walk step. Recursion through async code needs the indirection.
type WalkFuture<'a> = Pin<Box<dyn Future<Output = ReplicationResult<()>> + Send + 'a>>;

/// Counters over the orchestrator's lifetime (reset by [`EntityOrchestrator::clear`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpawnStats {
    /// Spawner invocations that completed.
    pub constructed: u64,
    /// Entities parked waiting for a parent.
    pub deferred: u64,
    /// Entities released from the pending queue and spawned.
    pub released: u64,
    /// Already-spawned world entities moved in place.
    pub updated_in_place: u64,
    /// In-place updates skipped because the object was not loaded.
    pub missing_handles: u64,
    /// Readiness waits that hit the configured bound.
    pub readiness_timeouts: u64,
}

/// Realizes entity descriptions exactly once, parents first.
pub struct EntityOrchestrator {
    registry: SpawnerRegistry,
    ledger: SpawnLedger,
    pending: PendingDependencyQueue,
    engine: EngineBindings,
    config: ReplicationConfig,
    stats: SpawnStats,
}

impl EntityOrchestrator {
    /// Creates an orchestrator with empty ledger and pending queue.
    #[must_use]
    pub fn new(registry: SpawnerRegistry, engine: EngineBindings, config: ReplicationConfig) -> Self {
        Self {
            registry,
            ledger: SpawnLedger::new(),
            pending: PendingDependencyQueue::new(),
            engine,
            config,
            stats: SpawnStats::default(),
        }
    }

    /// Read access to the ledger.
    #[must_use]
    pub const fn ledger(&self) -> &SpawnLedger {
        &self.ledger
    }

    /// Read access to the pending queue.
    #[must_use]
    pub const fn pending(&self) -> &PendingDependencyQueue {
        &self.pending
    }

    /// Lifetime counters.
    #[must_use]
    pub const fn stats(&self) -> SpawnStats {
        self.stats
    }

    /// True iff `entity` is recorded with exactly its kind.
    #[must_use]
    pub fn was_already_spawned(&self, entity: &Entity) -> bool {
        self.ledger.was_already_spawned(entity)
    }

    /// True iff `id` has been realized as any kind.
    #[must_use]
    pub fn is_known(&self, id: EntityId) -> bool {
        self.ledger.is_known(id)
    }

    /// Kind `id` was realized as.
    ///
    /// # Errors
    ///
    /// [`ReplicationError::UnknownEntity`] if `id` was never realized.
    pub fn require_kind(&self, id: EntityId) -> ReplicationResult<Kind> {
        self.ledger.require_kind(id)
    }

    /// Forgets `id`. Returns whether it was recorded.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        self.ledger.remove(id)
    }

    /// Forgets `entity` and its nested children so they can be respawned.
    /// The caller must already have removed them from the world.
    pub fn remove_hierarchy(&mut self, entity: &Entity) {
        self.ledger.remove_hierarchy(entity);
    }

    /// Wholesale reset for disconnect or world unload.
    ///
    /// A walk abandoned mid-flight leaves marks for half-built entities and
    /// parked children behind; this is the only supported cleanup.
    pub fn clear(&mut self) {
        tracing::info!(
            "Clearing replication state ({} spawned, {} pending)",
            self.ledger.len(),
            self.pending.len()
        );
        self.ledger.clear();
        self.pending.clear();
        self.stats = SpawnStats::default();
    }

    /// Processes one batch, in order.
    ///
    /// # Errors
    ///
    /// Aborts on the first structural failure: an unregistered kind, a
    /// spawner error, or a readiness timeout under
    /// [`ReadinessTimeoutAction::Abort`]. Entities handled before the failure
    /// stay realized.
    pub async fn spawn_all(&mut self, entities: Vec<Entity>) -> ReplicationResult<()> {
        tracing::info!(
            "Spawning batch of {} entities ({} including nested children)",
            entities.len(),
            entities.iter().map(Entity::subtree_len).sum::<usize>()
        );

        for entity in entities {
            if self.ledger.was_already_spawned(&entity) {
                if entity.is_world_placed() {
                    self.update_transform(&entity);
                }
            } else if let Some(parent_id) = entity.parent_id.filter(|p| !self.ledger.is_known(*p)) {
                tracing::debug!("Entity {} waits on parent {}", entity.id, parent_id);
                self.stats.deferred += 1;
                self.pending.enqueue(entity)?;
            } else {
                self.spawn(entity).await?;
            }
        }

        Ok(())
    }

    /// Records an entity realized outside of a batch (a client-initiated
    /// spawn) and releases anything parked on it.
    ///
    /// # Errors
    ///
    /// Same as [`spawn_all`](Self::spawn_all), for the released children.
    pub async fn adopt(&mut self, entity: &Entity) -> ReplicationResult<()> {
        tracing::debug!("Adopting locally spawned entity {} as {}", entity.id, entity.kind);
        self.ledger.mark_spawned(entity);
        self.release_pending(entity.id).await
    }

    fn spawn(&mut self, mut entity: Entity) -> WalkFuture<'_> {
        Box::pin(async move {
            self.ledger.mark_spawned(&entity);

            let spawner = self.registry.get(entity.kind)?;
            let handle = spawner.spawn(&entity).await?;
            self.stats.constructed += 1;
            tracing::debug!("Constructed {} as {}", entity.id, entity.kind);

            let owns_children = spawner.spawns_own_children(&entity);
            let children = std::mem::take(&mut entity.child_entities);
            if owns_children {
                self.adopt_owned_children(&children).await?;
            } else {
                for child in children {
                    if !self.ledger.was_already_spawned(&child) {
                        self.spawn(child).await?;
                    }
                }
            }

            self.release_pending(entity.id).await?;

            if let Some(handle) = handle {
                if self.await_setup(entity.id, handle).await? {
                    if let Some(metadata) = &entity.metadata {
                        self.engine.metadata.apply(handle, metadata);
                    }
                }
            }

            Ok(())
        })
    }

    /// Records children the spawner built itself, so re-sent descriptions
    /// stay idempotent and anything parked on them is released.
    fn adopt_owned_children<'a>(&'a mut self, children: &'a [Entity]) -> WalkFuture<'a> {
        Box::pin(async move {
            for child in children {
                self.ledger.mark_spawned(child);
                self.adopt_owned_children(&child.child_entities).await?;
                self.release_pending(child.id).await?;
            }
            Ok(())
        })
    }

    /// Spawns everything parked on `parent_id`. If one child fails, the
    /// children after it go back into the queue.
    async fn release_pending(&mut self, parent_id: EntityId) -> ReplicationResult<()> {
        let mut released = self.pending.drain(parent_id).into_iter();

        while let Some(child) = released.next() {
            if self.ledger.was_already_spawned(&child) {
                continue;
            }

            tracing::debug!("Releasing {} now that {} exists", child.id, parent_id);
            self.stats.released += 1;
            if let Err(error) = self.spawn(child).await {
                self.pending.restore(parent_id, released.collect());
                return Err(error);
            }
        }
        Ok(())
    }

    /// Waits on the readiness gate. Returns false if metadata should be skipped.
    async fn await_setup(&mut self, id: EntityId, handle: ObjectHandle) -> ReplicationResult<bool> {
        let gate = Arc::clone(&self.engine.readiness);
        let timeout = self.config.readiness_timeout();
        let outcome = wait_until_ready(
            gate.as_ref(),
            handle,
            self.config.readiness_poll_interval(),
            timeout,
        )
        .await;

        if outcome == Readiness::Ready {
            return Ok(true);
        }

        self.stats.readiness_timeouts += 1;
        let waited_ms = timeout.map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));

        match self.config.readiness_timeout_action {
            ReadinessTimeoutAction::SkipMetadata => {
                tracing::warn!("Entity {} not ready after {}ms, skipping metadata", id, waited_ms);
                Ok(false)
            }
            ReadinessTimeoutAction::Abort => Err(ReplicationError::ReadinessTimeout { id, waited_ms }),
        }
    }

    fn update_transform(&mut self, entity: &Entity) {
        let Some(transform) = entity.transform() else {
            return;
        };

        match self.engine.live_objects.resolve(entity.id) {
            Some(handle) => {
                self.engine.live_objects.set_transform(handle, transform);
                self.stats.updated_in_place += 1;
            }
            None => {
                tracing::debug!(
                    "Entity {} was already spawned but not found (is it in another cell?) tech_type: {:?} class_id: {:?}",
                    entity.id,
                    entity.tech_type,
                    entity.class_id
                );
                self.stats.missing_handles += 1;
            }
        }
    }
}

impl std::fmt::Debug for EntityOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityOrchestrator")
            .field("registry", &self.registry)
            .field("ledger", &self.ledger)
            .field("pending", &self.pending)
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

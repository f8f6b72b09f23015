//! # Mock Implementations (For Testing)
//!
//! An in-memory engine, a configurable spawner and a recording packet sender.
//! The engine keeps one event log so tests can assert construction and
//! metadata order across spawners.

use crate::error::{ReplicationError, ReplicationResult};
use crate::integration::traits::{
    EngineBindings, LiveObjects, MetadataProcessor, ObjectHandle, PacketSender, PrefabDescendant,
    ReadinessGate,
};
use crate::spawning::Spawner;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use undertow_shared::{Entity, EntityId, EntityMetadata, OutboundPacket, Transform};

/// Something the mock engine observed.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// A spawner constructed this entity.
    Constructed(EntityId),
    /// Metadata was applied to this entity's object.
    MetadataApplied(EntityId),
    /// This entity's object was moved.
    TransformSet(EntityId),
}

struct MockObject {
    id: EntityId,
    transform: Transform,
    alive: bool,
    setup_polls_remaining: u32,
    reportable: Option<EntityMetadata>,
    applied: Vec<EntityMetadata>,
    descendants: Vec<PrefabDescendant>,
}

#[derive(Default)]
struct MockEngineState {
    objects: HashMap<ObjectHandle, MockObject>,
    by_id: HashMap<EntityId, ObjectHandle>,
    next_handle: u64,
    events: Vec<EngineEvent>,
}

/// In-memory engine implementing every engine-side trait.
#[derive(Default)]
pub struct MockEngine {
    state: Mutex<MockEngineState>,
}

impl MockEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundles this engine as the orchestrator's collaborators.
    #[must_use]
    pub fn bindings(self: &Arc<Self>) -> EngineBindings {
        EngineBindings {
            live_objects: Arc::clone(self) as Arc<dyn LiveObjects>,
            metadata: Arc::clone(self) as Arc<dyn MetadataProcessor>,
            readiness: Arc::clone(self) as Arc<dyn ReadinessGate>,
        }
    }

    /// Realizes `entity`. The object stays unready for `setup_polls`
    /// readiness polls; `u32::MAX` means it never becomes ready.
    pub fn create_object(&self, entity: &Entity, setup_polls: u32) -> ObjectHandle {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = ObjectHandle(state.next_handle);

        state.objects.insert(
            handle,
            MockObject {
                id: entity.id,
                transform: entity.transform().copied().unwrap_or_default(),
                alive: true,
                setup_polls_remaining: setup_polls,
                reportable: None,
                applied: Vec::new(),
                descendants: Vec::new(),
            },
        );
        state.by_id.insert(entity.id, handle);
        state.events.push(EngineEvent::Constructed(entity.id));
        handle
    }

    /// Logs a construction that produced no object.
    pub fn record_construction(&self, id: EntityId) {
        self.state.lock().events.push(EngineEvent::Constructed(id));
    }

    /// Destroys an object. Its handle stays resolvable but reports dead.
    pub fn destroy(&self, handle: ObjectHandle) {
        if let Some(object) = self.state.lock().objects.get_mut(&handle) {
            object.alive = false;
        }
    }

    /// Sets what `extract` will report for `handle`.
    pub fn set_reportable_metadata(&self, handle: ObjectHandle, metadata: Option<EntityMetadata>) {
        if let Some(object) = self.state.lock().objects.get_mut(&handle) {
            object.reportable = metadata;
        }
    }

    /// Attaches a tagged descendant to `parent`.
    pub fn add_descendant(&self, parent: ObjectHandle, descendant: PrefabDescendant) {
        if let Some(object) = self.state.lock().objects.get_mut(&parent) {
            object.descendants.push(descendant);
        }
    }

    /// Full event log.
    #[must_use]
    pub fn events(&self) -> Vec<EngineEvent> {
        self.state.lock().events.clone()
    }

    /// Ids in construction order.
    #[must_use]
    pub fn constructed(&self) -> Vec<EntityId> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Constructed(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Metadata applied to the object currently bound to `id`.
    #[must_use]
    pub fn applied_metadata(&self, id: EntityId) -> Vec<EntityMetadata> {
        let state = self.state.lock();
        state
            .by_id
            .get(&id)
            .and_then(|handle| state.objects.get(handle))
            .map(|object| object.applied.clone())
            .unwrap_or_default()
    }
}

impl LiveObjects for MockEngine {
    fn resolve(&self, id: EntityId) -> Option<ObjectHandle> {
        self.state.lock().by_id.get(&id).copied()
    }

    fn is_alive(&self, handle: ObjectHandle) -> bool {
        self.state.lock().objects.get(&handle).is_some_and(|o| o.alive)
    }

    fn transform_of(&self, handle: ObjectHandle) -> Option<Transform> {
        self.state
            .lock()
            .objects
            .get(&handle)
            .filter(|o| o.alive)
            .map(|o| o.transform)
    }

    fn set_transform(&self, handle: ObjectHandle, transform: &Transform) {
        let mut state = self.state.lock();
        let moved = state.objects.get_mut(&handle).map(|object| {
            object.transform = *transform;
            object.id
        });
        if let Some(id) = moved {
            state.events.push(EngineEvent::TransformSet(id));
        }
    }

    fn prefab_descendants(&self, handle: ObjectHandle) -> Vec<PrefabDescendant> {
        self.state
            .lock()
            .objects
            .get(&handle)
            .map(|o| o.descendants.clone())
            .unwrap_or_default()
    }
}

impl MetadataProcessor for MockEngine {
    fn extract(&self, handle: ObjectHandle) -> Option<EntityMetadata> {
        self.state.lock().objects.get(&handle).and_then(|o| o.reportable.clone())
    }

    fn apply(&self, handle: ObjectHandle, metadata: &EntityMetadata) {
        let mut state = self.state.lock();
        let applied_to = state.objects.get_mut(&handle).map(|object| {
            object.applied.push(metadata.clone());
            object.id
        });
        if let Some(id) = applied_to {
            state.events.push(EngineEvent::MetadataApplied(id));
        }
    }
}

impl ReadinessGate for MockEngine {
    fn is_ready(&self, handle: ObjectHandle) -> bool {
        let mut state = self.state.lock();
        let Some(object) = state.objects.get_mut(&handle) else {
            return true;
        };
        match object.setup_polls_remaining {
            0 => true,
            u32::MAX => false,
            _ => {
                object.setup_polls_remaining -= 1;
                false
            }
        }
    }
}

/// Spawner that realizes entities in a [`MockEngine`].
pub struct MockSpawner {
    engine: Arc<MockEngine>,
    produces_handle: bool,
    owns_children: bool,
    setup_polls: u32,
    fail_with: Option<String>,
}

impl MockSpawner {
    /// Produces a ready object per entity and lets the orchestrator recurse.
    #[must_use]
    pub fn new(engine: Arc<MockEngine>) -> Self {
        Self {
            engine,
            produces_handle: true,
            owns_children: false,
            setup_polls: 0,
            fail_with: None,
        }
    }

    /// Constructs nothing addressable.
    #[must_use]
    pub fn data_only(mut self) -> Self {
        self.produces_handle = false;
        self
    }

    /// Claims to construct `child_entities` itself.
    #[must_use]
    pub fn owning_children(mut self) -> Self {
        self.owns_children = true;
        self
    }

    /// Objects need `polls` readiness polls before they are ready.
    #[must_use]
    pub fn with_setup_polls(mut self, polls: u32) -> Self {
        self.setup_polls = polls;
        self
    }

    /// Every spawn fails with `reason`.
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.fail_with = Some(reason.into());
        self
    }

    /// Wraps this spawner for registration.
    #[must_use]
    pub fn shared(self) -> Arc<dyn Spawner> {
        Arc::new(self)
    }
}

#[async_trait]
impl Spawner for MockSpawner {
    fn spawns_own_children(&self, _entity: &Entity) -> bool {
        self.owns_children
    }

    async fn spawn(&self, entity: &Entity) -> ReplicationResult<Option<ObjectHandle>> {
        // Engine construction completes on a later poll.
        tokio::task::yield_now().await;

        if let Some(reason) = &self.fail_with {
            return Err(ReplicationError::SpawnFailed {
                id: entity.id,
                kind: entity.kind,
                reason: reason.clone(),
            });
        }

        if self.produces_handle {
            Ok(Some(self.engine.create_object(entity, self.setup_polls)))
        } else {
            self.engine.record_construction(entity.id);
            Ok(None)
        }
    }
}

/// Packet sender that keeps everything it is given.
#[derive(Default)]
pub struct RecordingPacketSender {
    sent: Mutex<Vec<OutboundPacket>>,
}

impl RecordingPacketSender {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Packets sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundPacket> {
        self.sent.lock().clone()
    }
}

impl PacketSender for RecordingPacketSender {
    fn send(&self, packet: OutboundPacket) -> ReplicationResult<()> {
        self.sent.lock().push(packet);
        Ok(())
    }
}

//! # Integration Traits
//!
//! Seams between the replication client and the rest of the program.
//!
//! The replication client DOES NOT reach into the engine or the transport.
//! Instead, we define traits here that those sides implement.
//!
//! ```text
//! Replication defines:    Engine / transport implements:
//! ┌──────────────────┐    ┌──────────────────┐
//! │ trait LiveObjects│ ←─ │ impl LiveObjects │
//! └──────────────────┘    └──────────────────┘
//! ```

use crate::error::{ReplicationError, ReplicationResult};
use std::sync::Arc;
use undertow_shared::{EntityId, EntityMetadata, OutboundPacket, Transform};

/// Opaque reference to a realized engine object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

// ============================================================================
// TRANSPORT
// ============================================================================

/// Hands outgoing packets to the transport.
pub trait PacketSender: Send + Sync {
    /// Queues `packet` for delivery to the authority.
    ///
    /// # Errors
    ///
    /// [`ReplicationError::ChannelClosed`] if the transport is gone.
    fn send(&self, packet: OutboundPacket) -> ReplicationResult<()>;
}

/// [`PacketSender`] backed by a crossbeam channel drained by the network thread.
#[derive(Clone, Debug)]
pub struct ChannelPacketSender {
    tx: crossbeam_channel::Sender<OutboundPacket>,
}

impl ChannelPacketSender {
    /// Creates an unbounded sender and the receiver the network thread reads.
    #[must_use]
    pub fn unbounded() -> (Self, crossbeam_channel::Receiver<OutboundPacket>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl PacketSender for ChannelPacketSender {
    fn send(&self, packet: OutboundPacket) -> ReplicationResult<()> {
        self.tx.send(packet).map_err(|_| ReplicationError::ChannelClosed)
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// A tagged descendant of a realized object, as listed by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct PrefabDescendant {
    /// The descendant object.
    pub handle: ObjectHandle,
    /// Its replication id.
    pub id: EntityId,
    /// Its prefab class.
    pub class_id: String,
    /// Its item type, if tagged with one.
    pub tech_type: Option<String>,
}

/// Lookup and transform access for live engine objects.
pub trait LiveObjects: Send + Sync {
    /// Finds the live object for `id`, if it is currently loaded.
    fn resolve(&self, id: EntityId) -> Option<ObjectHandle>;

    /// False once the object has been destroyed.
    fn is_alive(&self, handle: ObjectHandle) -> bool;

    /// Current world transform.
    fn transform_of(&self, handle: ObjectHandle) -> Option<Transform>;

    /// Moves the object.
    fn set_transform(&self, handle: ObjectHandle, transform: &Transform);

    /// Tagged descendants of `handle`, excluding `handle` itself.
    fn prefab_descendants(&self, handle: ObjectHandle) -> Vec<PrefabDescendant>;
}

/// Kind-specific metadata extraction and application.
pub trait MetadataProcessor: Send + Sync {
    /// Reads reportable metadata from the object. `None` is normal.
    fn extract(&self, handle: ObjectHandle) -> Option<EntityMetadata>;

    /// Applies metadata to the object. Children are already constructed.
    fn apply(&self, handle: ObjectHandle, metadata: &EntityMetadata);
}

/// Predicate for multi-phase engine setup.
pub trait ReadinessGate: Send + Sync {
    /// True once the object's deferred setup has finished.
    fn is_ready(&self, handle: ObjectHandle) -> bool;
}

/// Engine-side collaborators of the orchestrator.
#[derive(Clone)]
pub struct EngineBindings {
    /// Live object lookup.
    pub live_objects: Arc<dyn LiveObjects>,
    /// Metadata extraction and application.
    pub metadata: Arc<dyn MetadataProcessor>,
    /// Readiness predicate.
    pub readiness: Arc<dyn ReadinessGate>,
}

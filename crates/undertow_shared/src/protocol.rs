//! Packets the replication client sends to the authority.
//!
//! Both sides must agree on these definitions. Framing and encoding belong to
//! the transport; this module only fixes the payload shapes.

use crate::entity::{Entity, EntityId, EntityMetadata};
use crate::math::{Quaternion, Vec3};
use serde::{Deserialize, Serialize};

/// Packet type identifier
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketType {
    /// Batched positions of locally simulated entities
    EntityTransformUpdates = 0,
    /// Metadata of one entity changed locally
    EntityMetadataUpdate = 1,
    /// The client spawned a world entity on its own initiative
    EntitySpawnedByClient = 2,
}

/// One entry of a transform batch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformUpdate {
    /// Entity ID
    pub id: EntityId,
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quaternion,
}

/// Transform batch, one per broadcast tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTransformUpdates {
    /// Updates in collection order
    pub updates: Vec<TransformUpdate>,
}

impl EntityTransformUpdates {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entity's transform.
    pub fn add_update(&mut self, id: EntityId, position: Vec3, rotation: Quaternion) {
        self.updates.push(TransformUpdate { id, position, rotation });
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Returns true if the batch carries nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Outgoing packet payloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OutboundPacket {
    /// Transform batch
    EntityTransformUpdates(EntityTransformUpdates),
    /// Metadata change for one entity
    EntityMetadataUpdate {
        /// Entity ID
        id: EntityId,
        /// New metadata
        metadata: EntityMetadata,
    },
    /// Client-initiated spawn, for the authority to reconcile
    EntitySpawnedByClient {
        /// Full description of the spawned entity
        entity: Entity,
    },
}

impl OutboundPacket {
    /// Returns the packet type
    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        match self {
            Self::EntityTransformUpdates(_) => PacketType::EntityTransformUpdates,
            Self::EntityMetadataUpdate { .. } => PacketType::EntityMetadataUpdate,
            Self::EntitySpawnedByClient { .. } => PacketType::EntitySpawnedByClient,
        }
    }
}

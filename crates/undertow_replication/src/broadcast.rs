//! # Outbound Broadcaster
//!
//! Turns local state changes into packets for the authority: transform
//! batches, metadata changes and client-initiated spawns.

use crate::error::{ReplicationError, ReplicationResult};
use crate::integration::{LiveObjects, MetadataProcessor, ObjectHandle, PacketSender, PrefabDescendant};
use std::collections::HashMap;
use std::sync::Arc;
use undertow_shared::{Entity, EntityId, EntityMetadata, EntityTransformUpdates, Kind, OutboundPacket, Placement};

/// Assembles and sends outgoing replication packets.
#[derive(Clone)]
pub struct OutboundBroadcaster {
    sender: Arc<dyn PacketSender>,
    live_objects: Arc<dyn LiveObjects>,
    metadata: Arc<dyn MetadataProcessor>,
}

impl OutboundBroadcaster {
    /// Creates a broadcaster over the given transport and engine views.
    #[must_use]
    pub fn new(
        sender: Arc<dyn PacketSender>,
        live_objects: Arc<dyn LiveObjects>,
        metadata: Arc<dyn MetadataProcessor>,
    ) -> Self {
        Self { sender, live_objects, metadata }
    }

    /// Sends one batch with the current position and rotation of every live
    /// object in `objects`. Destroyed objects are skipped; they are routinely
    /// removed between ticks.
    ///
    /// Returns the number of entries in the batch.
    ///
    /// # Errors
    ///
    /// Transport failures from the [`PacketSender`].
    pub fn broadcast_transforms(&self, objects: &HashMap<EntityId, ObjectHandle>) -> ReplicationResult<usize> {
        let mut update = EntityTransformUpdates::new();

        for (id, handle) in objects {
            if !self.live_objects.is_alive(*handle) {
                continue;
            }
            if let Some(transform) = self.live_objects.transform_of(*handle) {
                update.add_update(*id, transform.position, transform.rotation);
            }
        }

        let count = update.len();
        self.sender.send(OutboundPacket::EntityTransformUpdates(update))?;
        Ok(count)
    }

    /// Reports `handle`'s metadata for `id`, if it has any worth reporting.
    ///
    /// Returns whether a packet was sent.
    ///
    /// # Errors
    ///
    /// Transport failures from the [`PacketSender`].
    pub fn entity_metadata_changed(&self, handle: ObjectHandle, id: EntityId) -> ReplicationResult<bool> {
        match self.metadata.extract(handle) {
            Some(metadata) => {
                self.broadcast_metadata_update(id, metadata)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sends a metadata update unconditionally.
    ///
    /// # Errors
    ///
    /// Transport failures from the [`PacketSender`].
    pub fn broadcast_metadata_update(&self, id: EntityId, metadata: EntityMetadata) -> ReplicationResult<()> {
        self.sender.send(OutboundPacket::EntityMetadataUpdate { id, metadata })
    }

    /// Tells the authority the client spawned `entity` on its own initiative.
    ///
    /// # Errors
    ///
    /// [`ReplicationError::NotWorldPlaced`] for kinds without a world
    /// transform, otherwise transport failures.
    pub fn broadcast_client_spawn(&self, entity: &Entity) -> ReplicationResult<()> {
        if !entity.is_world_placed() {
            return Err(ReplicationError::NotWorldPlaced {
                id: entity.id,
                kind: entity.kind,
            });
        }

        tracing::debug!("Broadcasting client spawn of {} as {}", entity.id, entity.kind);
        self.sender.send(OutboundPacket::EntitySpawnedByClient { entity: entity.clone() })
    }

    /// Describes the notable children of a realized object as
    /// [`Kind::PrefabChild`] entities parented to `parent_id`.
    ///
    /// A child is notable when it has a prefab class and extractable metadata
    /// (a battery inside a flashlight). Children are grouped by class, and each
    /// gets its index among the notable members of its group.
    #[must_use]
    pub fn prefab_children(&self, handle: ObjectHandle, parent_id: EntityId) -> Vec<Entity> {
        let mut groups: Vec<(String, Vec<PrefabDescendant>)> = Vec::new();

        for descendant in self.live_objects.prefab_descendants(handle) {
            if descendant.handle == handle {
                continue;
            }
            match groups.iter_mut().find(|(class_id, _)| *class_id == descendant.class_id) {
                Some((_, members)) => members.push(descendant),
                None => groups.push((descendant.class_id.clone(), vec![descendant])),
            }
        }

        let mut children = Vec::new();
        for (class_id, members) in groups {
            let mut index_in_group = 0;

            for member in members {
                let Some(metadata) = self.metadata.extract(member.handle) else {
                    continue;
                };

                children.push(Entity {
                    id: member.id,
                    parent_id: Some(parent_id),
                    kind: Kind::PrefabChild,
                    class_id: Some(class_id.clone()),
                    tech_type: member.tech_type,
                    placement: Placement::PrefabChild { index_in_group },
                    metadata: Some(metadata),
                    child_entities: Vec::new(),
                });
                index_in_group += 1;
            }
        }

        children
    }
}

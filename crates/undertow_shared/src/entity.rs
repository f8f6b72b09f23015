//! Entity descriptions as received from the authority.
//!
//! An [`Entity`] is a *description*, not a live object. The replication client
//! consumes it once, hands it to a spawner, and keeps only the id and kind.

use crate::math::Transform;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Globally unique entity identifier.
///
/// Only equality matters; there is no ordering between ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Builds an id from a raw 128-bit value. Handy for fixtures.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Generates a fresh random id for a client-initiated spawn.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Dispatch tag for spawner selection.
///
/// The ledger stores this tag, so the same id may be respawned later under a
/// different kind (an inventory item dropped into the world, for example).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Tagged sub-object of a prefab (a battery inside a flashlight).
    PrefabChild,
    /// Container holding inventory items.
    Inventory,
    /// Item stored inside an inventory.
    InventoryItem,
    /// Plain object placed in the world.
    World,
    /// World group whose members are spawned by the group itself.
    PlaceholderGroup,
    /// Escape pod.
    EscapePod,
    /// Remote player body.
    Player,
    /// Vehicle.
    Vehicle,
}

impl Kind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::PrefabChild,
        Self::Inventory,
        Self::InventoryItem,
        Self::World,
        Self::PlaceholderGroup,
        Self::EscapePod,
        Self::Player,
        Self::Vehicle,
    ];

    /// Kinds that carry a world transform.
    pub const WORLD_PLACED: [Self; 5] = [
        Self::World,
        Self::PlaceholderGroup,
        Self::EscapePod,
        Self::Player,
        Self::Vehicle,
    ];

    /// Returns true if entities of this kind have a world transform.
    #[must_use]
    pub const fn is_world_placed(self) -> bool {
        matches!(
            self,
            Self::World | Self::PlaceholderGroup | Self::EscapePod | Self::Player | Self::Vehicle
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Where a described entity lives.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    /// No spatial data (inventories, items held in a container).
    #[default]
    Detached,
    /// Placed in the world.
    World(Transform),
    /// Nth tagged child of its class inside the parent prefab.
    PrefabChild {
        /// Position among siblings sharing the same class id.
        index_in_group: u32,
    },
}

/// Kind-specific payload. Only metadata processors interpret it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EntityMetadata {
    /// Charge state of a battery.
    Battery {
        /// Current charge.
        charge: f32,
        /// Maximum charge.
        capacity: f32,
    },
    /// Items equipped by a player, by slot name.
    Equipment {
        /// `(slot, item)` pairs; items must already be spawned.
        slots: Vec<(String, EntityId)>,
    },
    /// Player-visible label on a storage container.
    Storage {
        /// Label text.
        label: String,
    },
    /// Payload this client has no typed representation for.
    Opaque(Vec<u8>),
}

/// A described, not-yet-realized world object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Identity.
    pub id: EntityId,
    /// Parent that must exist before this entity is constructed.
    pub parent_id: Option<EntityId>,
    /// Dispatch tag.
    pub kind: Kind,
    /// Prefab class.
    pub class_id: Option<String>,
    /// Game item type.
    pub tech_type: Option<String>,
    /// Spatial data.
    pub placement: Placement,
    /// Payload applied after construction.
    pub metadata: Option<EntityMetadata>,
    /// Nested descriptions, in declaration order.
    pub child_entities: Vec<Entity>,
}

impl Entity {
    /// Creates a bare description with no parent, children or metadata.
    #[must_use]
    pub fn new(id: EntityId, kind: Kind) -> Self {
        Self {
            id,
            parent_id: None,
            kind,
            class_id: None,
            tech_type: None,
            placement: Placement::Detached,
            metadata: None,
            child_entities: Vec::new(),
        }
    }

    /// Creates a world-placed description.
    #[must_use]
    pub fn world(id: EntityId, kind: Kind, transform: Transform) -> Self {
        Self {
            placement: Placement::World(transform),
            ..Self::new(id, kind)
        }
    }

    /// Sets the parent id.
    #[must_use]
    pub fn with_parent(mut self, parent_id: EntityId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the metadata payload.
    #[must_use]
    pub fn with_metadata(mut self, metadata: EntityMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Appends a nested child. The child's parent id is set to this entity.
    #[must_use]
    pub fn with_child(mut self, child: Entity) -> Self {
        self.child_entities.push(child.with_parent(self.id));
        self
    }

    /// Returns the world transform, if this description has one.
    #[must_use]
    pub const fn transform(&self) -> Option<&Transform> {
        match &self.placement {
            Placement::World(transform) => Some(transform),
            _ => None,
        }
    }

    /// Returns true if this entity's kind is world-placed.
    #[must_use]
    pub const fn is_world_placed(&self) -> bool {
        self.kind.is_world_placed()
    }

    /// Number of entities in this subtree, including this one.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.child_entities.iter().map(Self::subtree_len).sum::<usize>()
    }
}

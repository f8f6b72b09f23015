//! # Replication Error Types
//!
//! All errors that can occur while realizing or broadcasting entities.
//!
//! Missing live handles and empty metadata extractions are NOT errors: they
//! are routine and handled where they occur.

use thiserror::Error;
use undertow_shared::{EntityId, Kind};

/// Errors that can occur in the replication client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplicationError {
    /// No spawner registered for a received kind. Protocol/version mismatch.
    #[error("no spawner registered for kind {0}")]
    UnknownKind(Kind),

    /// The ledger has no record of this entity.
    #[error("did not have a kind for entity {0}")]
    UnknownEntity(EntityId),

    /// Tried to park an entity that has no parent to wait for.
    #[error("entity {0} has no parent id and cannot wait on one")]
    NoParent(EntityId),

    /// The engine failed to construct an entity.
    #[error("spawner for {kind} failed on entity {id}: {reason}")]
    SpawnFailed {
        /// Entity being constructed.
        id: EntityId,
        /// Kind it was constructed as.
        kind: Kind,
        /// Engine-provided reason.
        reason: String,
    },

    /// The readiness gate did not clear in time.
    #[error("entity {id} was not ready after {waited_ms}ms")]
    ReadinessTimeout {
        /// Entity whose setup never finished.
        id: EntityId,
        /// How long we waited.
        waited_ms: u64,
    },

    /// Client spawn broadcast for a kind that has no world transform.
    #[error("entity {id} of kind {kind} is not world-placed")]
    NotWorldPlaced {
        /// Entity ID.
        id: EntityId,
        /// Its kind.
        kind: Kind,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The packet channel has no receiver left.
    #[error("outbound packet channel closed")]
    ChannelClosed,
}

/// Result type for replication operations.
pub type ReplicationResult<T> = Result<T, ReplicationError>;

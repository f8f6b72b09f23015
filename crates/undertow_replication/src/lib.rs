//! # UNDERTOW Replication - Client-Side Entity Spawning
//!
//! Brings entities owned by a remote authority into existence on the client.
//!
//! ## Architecture
//!
//! - **Registry**: each entity kind maps to a spawner, and several kinds may
//!   share one
//! - **Ledger**: every id is realized once, and respawning as another kind
//!   replaces the record
//! - **Pending queue**: children that arrive before their parent wait for it
//! - **Orchestrator**: walks batches parent-first and applies metadata last
//! - **Broadcaster**: local transforms, metadata and spawns go back out
//!
//! ## Ordering Guarantees
//!
//! ```text
//! AUTHORITY                        CLIENT
//!   |                                 |
//!   |--- [Battery(parent=F), F] ----->|
//!   |                                 | F parked? no: F has no parent
//!   |                                 | Battery parked on F
//!   |                                 | construct F, release Battery
//!   |                                 | F ready -> apply F metadata
//!   |<-- EntityMetadataUpdate --------|
//! ```
//!
//! A parent is always constructed before its children, whatever order the
//! batch arrives in.
//!
//! ## Example
//!
//! ```rust,ignore
//! use undertow_replication::{Entities, ReplicationConfig, SpawnerRegistry, StandardSpawners};
//!
//! let registry = SpawnerRegistry::with_standard_layout(spawners);
//! let entities = Entities::new(registry, engine_bindings, packet_sender, ReplicationConfig::default());
//!
//! entities.spawn_all(batch).await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod broadcast;
pub mod client;
pub mod config;
pub mod error;
pub mod integration;
pub mod spawning;

pub use broadcast::OutboundBroadcaster;
pub use client::Entities;
pub use config::{ReadinessTimeoutAction, ReplicationConfig};
pub use error::{ReplicationError, ReplicationResult};
pub use integration::{
    ChannelPacketSender, EngineBindings, LiveObjects, MetadataProcessor, ObjectHandle,
    PacketSender, PrefabDescendant, ReadinessGate,
};
pub use spawning::{
    EntityOrchestrator, PendingDependencyQueue, SpawnLedger, SpawnStats, Spawner, SpawnerRegistry,
    StandardSpawners,
};

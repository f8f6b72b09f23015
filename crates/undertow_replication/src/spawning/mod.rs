//! # Entity Spawning
//!
//! The core of the replication client, leaf to root:
//!
//! - [`SpawnerRegistry`]: kind → construction strategy
//! - [`SpawnLedger`]: which ids exist locally, and as what kind
//! - [`PendingDependencyQueue`]: children that arrived before their parent
//! - [`EntityOrchestrator`]: walks batches and drives all of the above

pub mod ledger;
pub mod orchestrator;
pub mod pending;
pub mod readiness;
pub mod registry;

pub use ledger::SpawnLedger;
pub use orchestrator::{EntityOrchestrator, SpawnStats};
pub use pending::PendingDependencyQueue;
pub use readiness::{wait_until_ready, Readiness};
pub use registry::{Spawner, SpawnerRegistry, StandardSpawners};

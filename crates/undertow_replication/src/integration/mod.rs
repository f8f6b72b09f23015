//! # Integration Layer
//!
//! Interfaces the replication client needs from the outside world, plus
//! in-memory implementations for tests.
//!
//! ## Data Flow
//!
//! ```text
//! Transport → Entities::spawn_all → Spawner (engine) → ReadinessGate
//!                                                      ↓
//!                                             MetadataProcessor::apply
//!
//! LiveObjects / MetadataProcessor::extract → OutboundBroadcaster → PacketSender
//! ```

pub mod mock;
pub mod traits;

pub use traits::*;

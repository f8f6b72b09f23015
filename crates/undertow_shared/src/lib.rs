//! # UNDERTOW Shared
//!
//! Types used on both sides of the replication seam: entity descriptions,
//! identifiers, transforms and outgoing packet payloads.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on the engine, the async runtime or the
//! transport. If you need those, put them in `undertow_replication`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod entity;
pub mod math;
pub mod protocol;

pub use entity::{Entity, EntityId, EntityMetadata, Kind, Placement};
pub use math::{Quaternion, Transform, Vec3};
pub use protocol::{EntityTransformUpdates, OutboundPacket, PacketType, TransformUpdate};

//! Realm Kernel: authoritative live-world state, zone index maintenance and decay.
//!
//! # Invariants
//! - A toplevel object in the world is listed in exactly one zone: the zone of
//!   its current position, under the list for its kind.
//! - Every decay entry appears in both registry indices, and an object has at
//!   most one entry.
//! - Decay hooks never observe a half-updated registry.

pub mod decay;
pub mod integrity;
pub mod object;
pub mod spatial;
pub mod world;

pub use decay::{DecayHooks, Eligibility, NoHooks, SweepReport};
pub use integrity::{IntegrityIssue, IntegrityReport};
pub use object::{DescriptorTable, Footprint, ObjectDescriptor, ObjectKind, WorldObject};
pub use spatial::SpatialError;
pub use world::WorldState;

pub fn crate_info() -> &'static str {
    "realmkeep-kernel v0.1.0"
}

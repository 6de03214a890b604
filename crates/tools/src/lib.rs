//! Developer Tooling: read-only inspection of world state, zones and pending decay.
//!
//! # Invariants
//! - Inspection never mutates the world.

mod inspector;

pub use inspector::{ObjectInfo, RealmSummary, WorldInspector, WorldSummary, ZoneInfo};

pub fn crate_info() -> &'static str {
    "realmkeep-tools v0.1.0"
}

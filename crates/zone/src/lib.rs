//! Zone grids: per-realm spatial partition of world objects.
//!
//! # Invariants
//! - Each realm's surface is covered by a `grid_width x grid_height` array of
//!   zones, each `ZONE_SIZE` tiles on a side.
//! - A zone holds plain handles; it never owns objects.
//!
//! This crate is the leaf data structure. Keeping bucket membership in step
//! with object positions is the kernel's job.

mod grid;
mod realm;

pub use grid::{Zone, ZoneGrid, ZoneKind};
pub use realm::{Realm, RealmConfig, RealmError, WorldChangeReason};

pub fn crate_info() -> &'static str {
    "realmkeep-zone v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("zone"));
    }
}

//! Shared types for the realmkeep world registry.
//!
//! Everything here is plain data: object and realm identifiers, tile
//! positions, zone coordinates, rectangular areas and the game clock.

pub mod area;
pub mod clock;
pub mod types;

pub use area::{Area2d, Area3d};
pub use clock::{GameClock, GameTime, ManualClock, SystemClock};
pub use types::{ObjectId, Pos2d, Pos3d, Pos4d, RealmId, ZONE_SHIFT, ZONE_SIZE, ZoneCoord};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge length, in tiles, of one zone bucket.
pub const ZONE_SIZE: u16 = 64;
/// `log2(ZONE_SIZE)`; tile coordinates are shifted right by this to get zone coordinates.
pub const ZONE_SHIFT: u16 = 6;

/// Stable identifier (serial) of a world object.
///
/// Every index in the registry keys on this value; it never changes for the
/// lifetime of an object and is never reused while any handle may still exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Index of a realm within the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct RealmId(pub u16);

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "realm#{}", self.0)
    }
}

/// A tile position on a realm's surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos2d {
    pub x: u16,
    pub y: u16,
}

impl Pos2d {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Component-wise minimum.
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Zone bucket containing this tile.
    pub fn zone(self) -> ZoneCoord {
        ZoneCoord::new((self.x >> ZONE_SHIFT) as u32, (self.y >> ZONE_SHIFT) as u32)
    }
}

impl fmt::Display for Pos2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// A tile position plus elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos3d {
    pub x: u16,
    pub y: u16,
    pub z: i8,
}

impl Pos3d {
    pub fn new(x: u16, y: u16, z: i8) -> Self {
        Self { x, y, z }
    }

    pub fn xy(self) -> Pos2d {
        Pos2d::new(self.x, self.y)
    }
}

/// A full world position: tile, elevation and realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos4d {
    pub x: u16,
    pub y: u16,
    pub z: i8,
    pub realm: RealmId,
}

impl Pos4d {
    pub fn new(x: u16, y: u16, z: i8, realm: RealmId) -> Self {
        Self { x, y, z, realm }
    }

    pub fn xy(self) -> Pos2d {
        Pos2d::new(self.x, self.y)
    }

    pub fn xyz(self) -> Pos3d {
        Pos3d::new(self.x, self.y, self.z)
    }

    /// Zone bucket this position falls into, within its own realm.
    pub fn zone(self) -> ZoneCoord {
        self.xy().zone()
    }

    /// Same tile and elevation, moved to another realm.
    pub fn with_realm(self, realm: RealmId) -> Self {
        Self { realm, ..self }
    }
}

impl fmt::Display for Pos4d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{}) in {}", self.x, self.y, self.z, self.realm)
    }
}

/// Coordinate of a zone bucket inside a realm grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ZoneCoord {
    pub x: u32,
    pub y: u32,
}

impl ZoneCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for ZoneCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_truncates_to_bucket_granularity() {
        assert_eq!(Pos2d::new(0, 0).zone(), ZoneCoord::new(0, 0));
        assert_eq!(Pos2d::new(63, 63).zone(), ZoneCoord::new(0, 0));
        assert_eq!(Pos2d::new(64, 127).zone(), ZoneCoord::new(1, 1));
        assert_eq!(Pos2d::new(130, 260).zone(), ZoneCoord::new(2, 4));
    }

    #[test]
    fn pos4d_zone_ignores_elevation_and_realm() {
        let a = Pos4d::new(200, 70, -5, RealmId(0));
        let b = Pos4d::new(200, 70, 40, RealmId(3));
        assert_eq!(a.zone(), b.zone());
    }

    #[test]
    fn object_id_displays_as_hex_serial() {
        assert_eq!(ObjectId(0x4000_00AB).to_string(), "0x400000AB");
    }

    #[test]
    fn with_realm_keeps_coordinates() {
        let p = Pos4d::new(10, 20, 5, RealmId(0)).with_realm(RealmId(2));
        assert_eq!(p.xyz(), Pos3d::new(10, 20, 5));
        assert_eq!(p.realm, RealmId(2));
    }
}

use serde::{Deserialize, Serialize};

use crate::types::{Pos2d, Pos3d};

/// Inclusive rectangle of tiles, normalized so `nw <= se` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area2d {
    nw: Pos2d,
    se: Pos2d,
}

impl Area2d {
    /// Build an area from two opposite corners in any order.
    pub fn new(a: Pos2d, b: Pos2d) -> Self {
        Self {
            nw: a.min(b),
            se: a.max(b),
        }
    }

    pub fn nw(&self) -> Pos2d {
        self.nw
    }

    pub fn se(&self) -> Pos2d {
        self.se
    }

    /// Clamp both corners into a `width` x `height` tile map.
    pub fn cropped(self, width: u16, height: u16) -> Self {
        let max = Pos2d::new(width.saturating_sub(1), height.saturating_sub(1));
        Self::new(self.nw.min(max), self.se.min(max))
    }

    pub fn contains(&self, p: Pos2d) -> bool {
        self.nw.x <= p.x && p.x <= self.se.x && self.nw.y <= p.y && p.y <= self.se.y
    }

    pub fn intersects(&self, other: &Area2d) -> bool {
        self.nw.x <= other.se.x
            && other.nw.x <= self.se.x
            && self.nw.y <= other.se.y
            && other.nw.y <= self.se.y
    }

    /// Iterate every tile of the area, row by row.
    pub fn iter(&self) -> impl Iterator<Item = Pos2d> + '_ {
        (self.nw.y..=self.se.y)
            .flat_map(move |y| (self.nw.x..=self.se.x).map(move |x| Pos2d::new(x, y)))
    }
}

/// An [`Area2d`] with an inclusive elevation range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area3d {
    area: Area2d,
    z_bottom: i8,
    z_top: i8,
}

impl Area3d {
    pub fn new(a: Pos3d, b: Pos3d) -> Self {
        Self {
            area: Area2d::new(a.xy(), b.xy()),
            z_bottom: a.z.min(b.z),
            z_top: a.z.max(b.z),
        }
    }

    pub fn area(&self) -> &Area2d {
        &self.area
    }

    pub fn z_range(&self) -> (i8, i8) {
        (self.z_bottom, self.z_top)
    }

    pub fn contains(&self, p: Pos3d) -> bool {
        self.area.contains(p.xy()) && self.z_bottom <= p.z && p.z <= self.z_top
    }

    pub fn intersects(&self, other: &Area3d) -> bool {
        self.area.intersects(&other.area)
            && self.z_bottom <= other.z_top
            && other.z_bottom <= self.z_top
    }
}

use std::collections::BTreeSet;

use realmkeep_common::{ObjectId, Pos2d, RealmId, ZONE_SIZE, ZoneCoord};
use serde::{Deserialize, Serialize};

use crate::grid::{Zone, ZoneGrid, ZoneKind};

/// Static description of a realm's map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmConfig {
    pub name: String,
    /// Map width in tiles.
    pub width: u16,
    /// Map height in tiles.
    pub height: u16,
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            name: "britannia".to_string(),
            width: 6144,
            height: 4096,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    #[error("realm '{name}' has an empty map ({width}x{height})")]
    EmptyMap { name: String, width: u16, height: u16 },
    #[error("realm name must not be empty")]
    Unnamed,
    #[error("realm '{0}' is defined more than once")]
    Duplicate(String),
}

/// Why a creature entered or left a realm's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldChangeReason {
    PlayerEnter,
    PlayerExit,
    NpcCreate,
    NpcDeath,
    Moved,
}

impl WorldChangeReason {
    pub fn label(self) -> &'static str {
        match self {
            WorldChangeReason::PlayerEnter => "client enter",
            WorldChangeReason::PlayerExit => "client exit",
            WorldChangeReason::NpcCreate => "NPC create",
            WorldChangeReason::NpcDeath => "NPC death",
            WorldChangeReason::Moved => "moved",
        }
    }
}

/// A named space with its own zone grid and object registries.
#[derive(Debug, Clone)]
pub struct Realm {
    id: RealmId,
    name: String,
    width: u16,
    height: u16,
    grid: ZoneGrid,
    toplevel_items: usize,
    mobiles: usize,
    structures: BTreeSet<ObjectId>,
}

impl Realm {
    pub fn new(id: RealmId, config: &RealmConfig) -> Result<Self, RealmError> {
        if config.name.is_empty() {
            return Err(RealmError::Unnamed);
        }
        if config.width == 0 || config.height == 0 {
            return Err(RealmError::EmptyMap {
                name: config.name.clone(),
                width: config.width,
                height: config.height,
            });
        }
        // Maps whose size is not a multiple of ZONE_SIZE get a partial last row/column.
        let grid_width = (config.width as u32).div_ceil(ZONE_SIZE as u32);
        let grid_height = (config.height as u32).div_ceil(ZONE_SIZE as u32);
        tracing::debug!(
            realm = %config.name,
            grid_width,
            grid_height,
            "realm grid allocated"
        );
        Ok(Self {
            id,
            name: config.name.clone(),
            width: config.width,
            height: config.height,
            grid: ZoneGrid::new(grid_width, grid_height),
            toplevel_items: 0,
            mobiles: 0,
            structures: BTreeSet::new(),
        })
    }

    pub fn id(&self) -> RealmId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn grid(&self) -> &ZoneGrid {
        &self.grid
    }

    pub fn grid_width(&self) -> u32 {
        self.grid.width()
    }

    pub fn grid_height(&self) -> u32 {
        self.grid.height()
    }

    pub fn zone_count(&self) -> usize {
        self.grid.zone_count()
    }

    /// Whether the tile lies on this realm's map.
    pub fn contains(&self, pos: Pos2d) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Zone coordinate for a tile, or `None` if the tile is off the map.
    pub fn zone_for(&self, pos: Pos2d) -> Option<ZoneCoord> {
        self.contains(pos).then(|| pos.zone())
    }

    pub fn zone(&self, coord: ZoneCoord) -> Option<&Zone> {
        self.grid.get(coord)
    }

    pub fn zone_mut(&mut self, coord: ZoneCoord) -> Option<&mut Zone> {
        self.grid.get_mut(coord)
    }

    /// Scan the whole grid for `id` in the `kind` list. Diagnostic only.
    pub fn locate(&self, kind: ZoneKind, id: ObjectId) -> Vec<ZoneCoord> {
        self.grid
            .iter()
            .filter(|(_, zone)| zone.contains(kind, id))
            .map(|(coord, _)| coord)
            .collect()
    }

    pub fn add_toplevel_item(&mut self) {
        self.toplevel_items += 1;
    }

    pub fn remove_toplevel_item(&mut self) {
        self.toplevel_items = self.toplevel_items.saturating_sub(1);
    }

    pub fn toplevel_item_count(&self) -> usize {
        self.toplevel_items
    }

    pub fn add_mobile(&mut self, id: ObjectId, reason: WorldChangeReason) {
        self.mobiles += 1;
        tracing::trace!(realm = %self.name, %id, reason = reason.label(), "mobile added");
    }

    pub fn remove_mobile(&mut self, id: ObjectId, reason: WorldChangeReason) {
        self.mobiles = self.mobiles.saturating_sub(1);
        tracing::trace!(realm = %self.name, %id, reason = reason.label(), "mobile removed");
    }

    pub fn mobile_count(&self) -> usize {
        self.mobiles
    }

    pub fn add_structure(&mut self, id: ObjectId) {
        self.structures.insert(id);
    }

    pub fn remove_structure(&mut self, id: ObjectId) -> bool {
        self.structures.remove(&id)
    }

    /// Structures currently placed in this realm, in id order.
    pub fn structures(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.structures.iter().copied()
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    /// Release spare capacity in every zone list.
    pub fn optimize(&mut self) {
        for zone in self.grid.iter_mut() {
            zone.shrink_to_fit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn realm(width: u16, height: u16) -> Realm {
        let config = RealmConfig {
            name: "test".to_string(),
            width,
            height,
        };
        Realm::new(RealmId(0), &config).unwrap()
    }

    #[test]
    fn grid_covers_partial_zones() {
        let r = realm(130, 64);
        assert_eq!(r.grid_width(), 3);
        assert_eq!(r.grid_height(), 1);
        assert_eq!(r.zone_count(), 3);
    }

    #[test]
    fn default_realm_grid_size() {
        let r = Realm::new(RealmId(0), &RealmConfig::default()).unwrap();
        assert_eq!(r.grid_width(), 96);
        assert_eq!(r.grid_height(), 64);
    }

    #[test]
    fn empty_map_is_rejected() {
        let config = RealmConfig {
            name: "void".to_string(),
            width: 0,
            height: 64,
        };
        assert!(matches!(
            Realm::new(RealmId(0), &config),
            Err(RealmError::EmptyMap { .. })
        ));
    }

    #[test]
    fn zone_for_rejects_off_map_tiles() {
        let r = realm(100, 100);
        assert_eq!(r.zone_for(Pos2d::new(99, 99)), Some(ZoneCoord::new(1, 1)));
        assert_eq!(r.zone_for(Pos2d::new(100, 0)), None);
    }

    #[test]
    fn locate_finds_every_listing() {
        let mut r = realm(256, 256);
        for coord in [ZoneCoord::new(1, 2), ZoneCoord::new(3, 0)] {
            r.zone_mut(coord)
                .unwrap()
                .insert(ZoneKind::Npc, ObjectId(9));
        }
        let found = r.locate(ZoneKind::Npc, ObjectId(9));
        assert_eq!(found, vec![ZoneCoord::new(3, 0), ZoneCoord::new(1, 2)]);
        assert!(r.locate(ZoneKind::Player, ObjectId(9)).is_empty());
    }

    #[test]
    fn registries_never_underflow() {
        let mut r = realm(64, 64);
        r.remove_toplevel_item();
        r.remove_mobile(ObjectId(1), WorldChangeReason::NpcDeath);
        assert_eq!(r.toplevel_item_count(), 0);
        assert_eq!(r.mobile_count(), 0);
        r.add_toplevel_item();
        r.add_mobile(ObjectId(1), WorldChangeReason::NpcCreate);
        assert_eq!(r.toplevel_item_count(), 1);
        assert_eq!(r.mobile_count(), 1);
    }
}

use realmkeep_common::{ObjectId, ZoneCoord};

/// Which of a zone's four handle lists an object lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneKind {
    Item,
    Structure,
    Player,
    Npc,
}

impl ZoneKind {
    pub const ALL: [ZoneKind; 4] = [
        ZoneKind::Item,
        ZoneKind::Structure,
        ZoneKind::Player,
        ZoneKind::Npc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ZoneKind::Item => "item",
            ZoneKind::Structure => "structure",
            ZoneKind::Player => "player",
            ZoneKind::Npc => "npc",
        }
    }
}

/// One bucket of the grid.
///
/// Lists are flat vectors: buckets are small and scanned far more often than
/// they are searched.
#[derive(Debug, Clone, Default)]
pub struct Zone {
    pub items: Vec<ObjectId>,
    pub multis: Vec<ObjectId>,
    pub characters: Vec<ObjectId>,
    pub npcs: Vec<ObjectId>,
}

impl Zone {
    pub fn list(&self, kind: ZoneKind) -> &Vec<ObjectId> {
        match kind {
            ZoneKind::Item => &self.items,
            ZoneKind::Structure => &self.multis,
            ZoneKind::Player => &self.characters,
            ZoneKind::Npc => &self.npcs,
        }
    }

    fn list_mut(&mut self, kind: ZoneKind) -> &mut Vec<ObjectId> {
        match kind {
            ZoneKind::Item => &mut self.items,
            ZoneKind::Structure => &mut self.multis,
            ZoneKind::Player => &mut self.characters,
            ZoneKind::Npc => &mut self.npcs,
        }
    }

    pub fn contains(&self, kind: ZoneKind, id: ObjectId) -> bool {
        self.list(kind).contains(&id)
    }

    /// Append `id`. Returns false, leaving the zone untouched, if it is already listed.
    pub fn insert(&mut self, kind: ZoneKind, id: ObjectId) -> bool {
        let list = self.list_mut(kind);
        if list.contains(&id) {
            return false;
        }
        list.push(id);
        true
    }

    /// Remove `id`, preserving the order of the remaining handles.
    /// Returns false if it was not listed.
    pub fn remove(&mut self, kind: ZoneKind, id: ObjectId) -> bool {
        let list = self.list_mut(kind);
        match list.iter().position(|h| *h == id) {
            Some(idx) => {
                list.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Total handles across all four lists.
    pub fn len(&self) -> usize {
        self.items.len() + self.multis.len() + self.characters.len() + self.npcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shrink_to_fit(&mut self) {
        self.items.shrink_to_fit();
        self.multis.shrink_to_fit();
        self.characters.shrink_to_fit();
        self.npcs.shrink_to_fit();
    }
}

/// Dense `width x height` array of zones, stored row-major.
#[derive(Debug, Clone)]
pub struct ZoneGrid {
    width: u32,
    height: u32,
    zones: Vec<Zone>,
}

impl ZoneGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            zones: vec![Zone::default(); (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of zones in the grid.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    fn index(&self, coord: ZoneCoord) -> Option<usize> {
        if coord.x < self.width && coord.y < self.height {
            Some(coord.y as usize * self.width as usize + coord.x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, coord: ZoneCoord) -> Option<&Zone> {
        self.index(coord).map(|i| &self.zones[i])
    }

    pub fn get_mut(&mut self, coord: ZoneCoord) -> Option<&mut Zone> {
        self.index(coord).map(|i| &mut self.zones[i])
    }

    /// Every zone with its coordinate, x varying fastest.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneCoord, &Zone)> {
        let width = self.width.max(1) as usize;
        self.zones.iter().enumerate().map(move |(i, zone)| {
            (
                ZoneCoord::new((i % width) as u32, (i / width) as u32),
                zone,
            )
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Zone> {
        self.zones.iter_mut()
    }

    /// Total handle placements across all zones.
    pub fn total_placements(&self) -> usize {
        self.zones.iter().map(Zone::len).sum()
    }
}

use std::collections::HashMap;

use realmkeep_common::{Area3d, GameTime, ObjectId, Pos3d, Pos4d};
use realmkeep_zone::ZoneKind;
use serde::{Deserialize, Serialize};

/// Extent of a structure around its anchor tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Footprint {
    pub west: u16,
    pub north: u16,
    pub east: u16,
    pub south: u16,
    /// Elevation covered above the anchor.
    pub height: i8,
}

impl Footprint {
    /// Square footprint of `radius` tiles around the anchor.
    pub fn square(radius: u16, height: i8) -> Self {
        Self {
            west: radius,
            north: radius,
            east: radius,
            south: radius,
            height,
        }
    }

    /// The covered volume when anchored at `anchor`.
    pub fn area_at(&self, anchor: Pos4d) -> Area3d {
        Area3d::new(
            Pos3d::new(
                anchor.x.saturating_sub(self.west),
                anchor.y.saturating_sub(self.north),
                anchor.z,
            ),
            Pos3d::new(
                anchor.x.saturating_add(self.east),
                anchor.y.saturating_add(self.south),
                anchor.z.saturating_add(self.height),
            ),
        )
    }
}

/// Object variant, as far as the registry cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Item,
    Structure(Footprint),
    Player,
    Npc,
}

impl ObjectKind {
    pub fn zone_kind(self) -> ZoneKind {
        match self {
            ObjectKind::Item => ZoneKind::Item,
            ObjectKind::Structure(_) => ZoneKind::Structure,
            ObjectKind::Player => ZoneKind::Player,
            ObjectKind::Npc => ZoneKind::Npc,
        }
    }

    pub fn label(self) -> &'static str {
        self.zone_kind().label()
    }
}

/// A mutable world object tracked by the registry.
#[derive(Debug, Clone)]
pub struct WorldObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    /// Key into the [`DescriptorTable`].
    pub objtype: u32,
    /// Last known position. For contained objects this is stale; use the holder's.
    pub pos: Pos4d,
    pub movable: bool,
    /// Held by a script or a player interaction.
    pub in_use: bool,
    pub orphan: bool,
    /// Players only take a zone slot while logged in; always true for everything else.
    pub logged_in: bool,
    pub container: Option<ObjectId>,
    pub contents: Vec<ObjectId>,
    pub(crate) in_world: bool,
    pub(crate) has_decay_task: bool,
    pub(crate) supporting: Option<ObjectId>,
    pub(crate) supported: Vec<ObjectId>,
}

impl WorldObject {
    fn new(id: ObjectId, kind: ObjectKind, objtype: u32, pos: Pos4d) -> Self {
        Self {
            id,
            kind,
            objtype,
            pos,
            movable: matches!(kind, ObjectKind::Item),
            in_use: false,
            orphan: false,
            logged_in: true,
            container: None,
            contents: Vec::new(),
            in_world: false,
            has_decay_task: false,
            supporting: None,
            supported: Vec::new(),
        }
    }

    pub fn item(id: ObjectId, objtype: u32, pos: Pos4d) -> Self {
        Self::new(id, ObjectKind::Item, objtype, pos)
    }

    pub fn structure(id: ObjectId, objtype: u32, pos: Pos4d, footprint: Footprint) -> Self {
        Self::new(id, ObjectKind::Structure(footprint), objtype, pos)
    }

    pub fn player(id: ObjectId, objtype: u32, pos: Pos4d) -> Self {
        Self::new(id, ObjectKind::Player, objtype, pos)
    }

    pub fn npc(id: ObjectId, objtype: u32, pos: Pos4d) -> Self {
        Self::new(id, ObjectKind::Npc, objtype, pos)
    }

    pub fn with_movable(mut self, movable: bool) -> Self {
        self.movable = movable;
        self
    }

    pub fn with_logged_in(mut self, logged_in: bool) -> Self {
        self.logged_in = logged_in;
        self
    }

    pub fn is_toplevel(&self) -> bool {
        self.container.is_none()
    }

    /// Currently listed in a realm's zone index (or registries, for offline players).
    pub fn in_world(&self) -> bool {
        self.in_world
    }

    /// Denormalized "has a decay entry" flag.
    pub fn has_decay_task(&self) -> bool {
        self.has_decay_task
    }

    /// Structure this object is registered with, if any.
    pub fn supporting(&self) -> Option<ObjectId> {
        self.supporting
    }

    /// Objects registered as resting on this structure.
    pub fn supported(&self) -> &[ObjectId] {
        &self.supported
    }

    pub fn footprint(&self) -> Option<Footprint> {
        match self.kind {
            ObjectKind::Structure(footprint) => Some(footprint),
            _ => None,
        }
    }

    /// Whether a player's zone slot is currently held.
    pub(crate) fn occupies_zone(&self) -> bool {
        !matches!(self.kind, ObjectKind::Player) || self.logged_in
    }
}

/// Static, per-objtype metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDescriptor {
    pub objtype: u32,
    pub corpse: bool,
    /// Objects of this type may decay while resting on a structure.
    pub decays_on_structures: bool,
    /// Script that must approve destruction.
    pub destroy_script: Option<String>,
    /// Decay delay applied when an object of this type lands on the ground.
    pub decay_delay_secs: Option<GameTime>,
    pub description: Option<String>,
}

/// Descriptor lookup with a fallback for unknown types.
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    by_type: HashMap<u32, ObjectDescriptor>,
    fallback: ObjectDescriptor,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the descriptor for `descriptor.objtype`.
    pub fn insert(&mut self, descriptor: ObjectDescriptor) {
        self.by_type.insert(descriptor.objtype, descriptor);
    }

    pub fn get(&self, objtype: u32) -> &ObjectDescriptor {
        self.by_type.get(&objtype).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl FromIterator<ObjectDescriptor> for DescriptorTable {
    fn from_iter<I: IntoIterator<Item = ObjectDescriptor>>(iter: I) -> Self {
        let mut table = Self::new();
        for descriptor in iter {
            table.insert(descriptor);
        }
        table
    }
}

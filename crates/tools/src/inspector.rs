use std::fmt;

use realmkeep_common::{GameTime, ObjectId, Pos4d, RealmId, ZoneCoord};
use realmkeep_kernel::WorldState;
use realmkeep_zone::{Realm, ZoneKind};
use serde::Serialize;

/// World inspector for developer tooling.
///
/// Provides read-only queries against the world state for debugging and
/// the command-line front end.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the world state.
    pub fn summary(world: &WorldState) -> WorldSummary {
        WorldSummary {
            realms: world.realms().iter().map(Self::realm_summary).collect(),
            objects: world.object_count(),
            toplevel_items: world.toplevel_item_count(),
            mobiles: world.mobile_count(),
            pending_decay: world.decay_registry().len(),
            next_decay: world.decay_registry().next_expiry().map(|e| e.time),
        }
    }

    pub fn realm_summary(realm: &Realm) -> RealmSummary {
        let grid = realm.grid();
        RealmSummary {
            id: realm.id(),
            name: realm.name().to_string(),
            width: realm.width(),
            height: realm.height(),
            zones: grid.zone_count(),
            occupied_zones: grid.iter().filter(|(_, z)| !z.is_empty()).count(),
            placements: grid.total_placements(),
            structures: realm.structure_count(),
        }
    }

    /// Detailed view of a single object.
    pub fn inspect_object(world: &WorldState, id: ObjectId) -> Option<ObjectInfo> {
        let object = world.object(id)?;
        Some(ObjectInfo {
            id,
            kind: object.kind.label(),
            objtype: object.objtype,
            pos: object.pos,
            in_world: object.in_world(),
            container: object.container,
            contents: object.contents.len(),
            holder_zone: world.holder_zone(id),
            supporting: object.supporting(),
            decay_at: world.expiry_of(id),
        })
    }

    /// Handles listed in one zone.
    pub fn inspect_zone(world: &WorldState, realm: RealmId, coord: ZoneCoord) -> Option<ZoneInfo> {
        let zone = world.realm(realm)?.zone(coord)?;
        let list = |kind| zone.list(kind).to_vec();
        Some(ZoneInfo {
            realm,
            coord,
            items: list(ZoneKind::Item),
            structures: list(ZoneKind::Structure),
            players: list(ZoneKind::Player),
            npcs: list(ZoneKind::Npc),
        })
    }

    /// The `limit` earliest decay entries, in expiry order.
    pub fn upcoming_decay(world: &WorldState, limit: usize) -> Vec<(GameTime, ObjectId)> {
        world
            .decay_registry()
            .iter()
            .take(limit)
            .map(|e| (e.time, e.object))
            .collect()
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub realms: Vec<RealmSummary>,
    pub objects: usize,
    pub toplevel_items: usize,
    pub mobiles: usize,
    pub pending_decay: usize,
    pub next_decay: Option<GameTime>,
}

impl fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "World: realms={} objects={} toplevel_items={} mobiles={} pending_decay={}",
            self.realms.len(),
            self.objects,
            self.toplevel_items,
            self.mobiles,
            self.pending_decay
        )?;
        if let Some(next) = self.next_decay {
            write!(f, " next_decay={next}")?;
        }
        for realm in &self.realms {
            write!(f, "\n  {realm}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RealmSummary {
    pub id: RealmId,
    pub name: String,
    pub width: u16,
    pub height: u16,
    pub zones: usize,
    pub occupied_zones: usize,
    pub placements: usize,
    pub structures: usize,
}

impl fmt::Display for RealmSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Realm {} '{}' {}x{}: zones={} occupied={} placements={} structures={}",
            self.id,
            self.name,
            self.width,
            self.height,
            self.zones,
            self.occupied_zones,
            self.placements,
            self.structures
        )
    }
}

/// Detailed info about a single object.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub kind: &'static str,
    pub objtype: u32,
    pub pos: Pos4d,
    pub in_world: bool,
    pub container: Option<ObjectId>,
    pub contents: usize,
    pub holder_zone: Option<(RealmId, ZoneCoord)>,
    pub supporting: Option<ObjectId>,
    pub decay_at: Option<GameTime>,
}

impl fmt::Display for ObjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} type=0x{:04X} pos={}",
            self.kind, self.id, self.objtype, self.pos
        )?;
        if let Some(container) = self.container {
            write!(f, " in={container}")?;
        }
        if let Some((realm, zone)) = self.holder_zone {
            write!(f, " zone={realm}:{zone}")?;
        }
        if let Some(structure) = self.supporting {
            write!(f, " on={structure}")?;
        }
        match self.decay_at {
            Some(t) => write!(f, " decay_at={t}"),
            None => write!(f, " decay_at=-"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneInfo {
    pub realm: RealmId,
    pub coord: ZoneCoord,
    pub items: Vec<ObjectId>,
    pub structures: Vec<ObjectId>,
    pub players: Vec<ObjectId>,
    pub npcs: Vec<ObjectId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use realmkeep_decay::DecayConfig;
    use realmkeep_kernel::WorldObject;
    use realmkeep_zone::RealmConfig;

    fn world() -> WorldState {
        let realms = [
            RealmConfig {
                name: "britannia".to_string(),
                width: 256,
                height: 128,
            },
            RealmConfig {
                name: "ilshenar".to_string(),
                width: 64,
                height: 64,
            },
        ];
        WorldState::new(&realms, DecayConfig::default()).unwrap()
    }

    fn at(x: u16, y: u16) -> Pos4d {
        Pos4d::new(x, y, 0, RealmId(0))
    }

    #[test]
    fn summary_empty_world() {
        let summary = WorldInspector::summary(&world());
        assert_eq!(summary.objects, 0);
        assert_eq!(summary.realms.len(), 2);
        assert_eq!(summary.realms[0].zones, 8);
        assert_eq!(summary.realms[1].zones, 1);
        assert_eq!(summary.next_decay, None);
    }

    #[test]
    fn summary_counts_objects_and_decay() {
        let mut w = world();
        let a = w.create_item(1, at(10, 10)).unwrap();
        w.create_item(1, at(11, 10)).unwrap();
        let npc = w.allocate_id().unwrap();
        w.spawn(WorldObject::npc(npc, 0x190, at(200, 100))).unwrap();
        w.schedule(a, 42);

        let summary = WorldInspector::summary(&w);
        assert_eq!(summary.objects, 3);
        assert_eq!(summary.toplevel_items, 2);
        assert_eq!(summary.mobiles, 1);
        assert_eq!(summary.pending_decay, 1);
        assert_eq!(summary.next_decay, Some(42));
        assert_eq!(summary.realms[0].occupied_zones, 2);
        assert_eq!(summary.realms[0].placements, 3);
    }

    #[test]
    fn inspect_contained_object() {
        let mut w = world();
        let bag = w.create_item(1, at(100, 20)).unwrap();
        let coin = w.create_item(0x0eed, at(0, 0)).unwrap();
        w.put_in_container(coin, bag).unwrap();

        let info = WorldInspector::inspect_object(&w, coin).unwrap();
        assert!(!info.in_world);
        assert_eq!(info.container, Some(bag));
        assert_eq!(info.holder_zone, Some((RealmId(0), ZoneCoord::new(1, 0))));
        assert!(info.to_string().contains("type=0x0EED"));
        assert!(WorldInspector::inspect_object(&w, ObjectId(999)).is_none());
    }

    #[test]
    fn inspect_zone_lists_handles() {
        let mut w = world();
        let a = w.create_item(1, at(70, 70)).unwrap();
        let info = WorldInspector::inspect_zone(&w, RealmId(0), ZoneCoord::new(1, 1)).unwrap();
        assert_eq!(info.items, vec![a]);
        assert!(info.npcs.is_empty());
        assert!(WorldInspector::inspect_zone(&w, RealmId(0), ZoneCoord::new(9, 9)).is_none());
    }

    #[test]
    fn upcoming_decay_is_ordered() {
        let mut w = world();
        let a = w.create_item(1, at(1, 1)).unwrap();
        let b = w.create_item(1, at(2, 2)).unwrap();
        let c = w.create_item(1, at(3, 3)).unwrap();
        w.schedule(a, 30);
        w.schedule(b, 10);
        w.schedule(c, 20);
        assert_eq!(
            WorldInspector::upcoming_decay(&w, 2),
            vec![(10, b), (20, c)]
        );
    }

    #[test]
    fn summary_serializes() {
        let json = serde_json::to_value(WorldInspector::summary(&world())).unwrap();
        assert_eq!(json["realms"][1]["name"], "ilshenar");
    }
}

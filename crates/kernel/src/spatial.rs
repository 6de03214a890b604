//! Zone index maintenance: keeping bucket membership in step with positions.
//!
//! Every operation validates before it mutates. A failed precondition is
//! logged with full context and returned as a [`SpatialError`]; the index is
//! left exactly as it was.

use realmkeep_common::{ObjectId, Pos4d, RealmId, ZoneCoord};
use realmkeep_zone::{WorldChangeReason, ZoneKind};

use crate::object::ObjectKind;
use crate::world::WorldState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpatialError {
    #[error("object {id} is not in the object table")]
    UnknownObject { id: ObjectId },
    #[error("object id {id} is already in use")]
    IdInUse { id: ObjectId },
    #[error("no unused object serials remain")]
    SerialsExhausted,
    #[error("object {id} is inside container {container}, not toplevel")]
    NotToplevel { id: ObjectId, container: ObjectId },
    #[error("object {id} is not an item")]
    NotAnItem { id: ObjectId },
    #[error("putting {id} into {container} would create a container cycle")]
    ContainerCycle { id: ObjectId, container: ObjectId },
    #[error("object {id} refers to {realm}, which does not exist")]
    UnknownRealm { id: ObjectId, realm: RealmId },
    #[error("object {id} at {pos} is outside its realm's map")]
    OffMap { id: ObjectId, pos: Pos4d },
    #[error("{kind} {id} is already present in zone {zone} of realm '{realm}'")]
    AlreadyPresent {
        id: ObjectId,
        kind: &'static str,
        realm: String,
        zone: ZoneCoord,
    },
    #[error(
        "{kind} {id} at {pos} does not exist in zone {zone} of realm '{realm}' (found in {found:?})"
    )]
    Missing {
        id: ObjectId,
        kind: &'static str,
        realm: String,
        zone: ZoneCoord,
        pos: Pos4d,
        found: Vec<ZoneCoord>,
    },
}

impl SpatialError {
    /// Whether the index itself is inconsistent, as opposed to a bad request.
    pub fn is_consistency_violation(&self) -> bool {
        matches!(
            self,
            SpatialError::AlreadyPresent { .. } | SpatialError::Missing { .. }
        )
    }
}

/// Resolved target of an index operation.
struct Slot {
    kind: ObjectKind,
    realm: usize,
    zone: ZoneCoord,
    occupies_zone: bool,
}

impl WorldState {
    fn slot_at(&self, id: ObjectId, pos: Pos4d) -> Result<Slot, SpatialError> {
        let object = self
            .objects
            .get(&id)
            .ok_or(SpatialError::UnknownObject { id })?;
        if let Some(container) = object.container {
            return Err(SpatialError::NotToplevel { id, container });
        }
        let realm = self
            .realm(pos.realm)
            .ok_or(SpatialError::UnknownRealm { id, realm: pos.realm })?;
        let zone = realm
            .zone_for(pos.xy())
            .ok_or(SpatialError::OffMap { id, pos })?;
        Ok(Slot {
            kind: object.kind,
            realm: pos.realm.0 as usize,
            zone,
            occupies_zone: object.occupies_zone(),
        })
    }

    /// Add a toplevel object to the zone matching its current position.
    pub fn add(&mut self, id: ObjectId) -> Result<(), SpatialError> {
        let pos = self
            .objects
            .get(&id)
            .ok_or(SpatialError::UnknownObject { id })?
            .pos;
        let slot = self.slot_at(id, pos)?;
        let kind = slot.kind.zone_kind();
        let realm = &mut self.realms[slot.realm];

        if slot.occupies_zone {
            let inserted = realm
                .zone_mut(slot.zone)
                .is_some_and(|zone| zone.insert(kind, id));
            if !inserted {
                tracing::error!(
                    %id,
                    kind = kind.label(),
                    realm = realm.name(),
                    zone = %slot.zone,
                    x = pos.x,
                    y = pos.y,
                    "add: object already present in world zone"
                );
                return Err(SpatialError::AlreadyPresent {
                    id,
                    kind: kind.label(),
                    realm: realm.name().to_string(),
                    zone: slot.zone,
                });
            }
        }
        match slot.kind {
            ObjectKind::Item => realm.add_toplevel_item(),
            ObjectKind::Structure(_) => realm.add_structure(id),
            ObjectKind::Player => realm.add_mobile(id, WorldChangeReason::PlayerEnter),
            ObjectKind::Npc => realm.add_mobile(id, WorldChangeReason::NpcCreate),
        }
        if let Some(object) = self.objects.get_mut(&id) {
            object.in_world = true;
        }
        Ok(())
    }

    /// Remove a toplevel object from the zone matching its last known position.
    ///
    /// Items and structures are detached from the structure supporting them
    /// first. If the object is not where its position says, every zone of
    /// the realm is scanned and the places it was actually found are
    /// reported.
    pub fn remove(&mut self, id: ObjectId) -> Result<(), SpatialError> {
        let pos = self
            .objects
            .get(&id)
            .ok_or(SpatialError::UnknownObject { id })?
            .pos;
        let slot = self.slot_at(id, pos)?;
        let kind = slot.kind.zone_kind();

        if slot.occupies_zone {
            let realm = &self.realms[slot.realm];
            if !realm
                .zone(slot.zone)
                .is_some_and(|zone| zone.contains(kind, id))
            {
                return Err(self.report_missing(id, kind, slot.realm, slot.zone, pos, "remove"));
            }
        }

        if matches!(slot.kind, ObjectKind::Item | ObjectKind::Structure(_)) {
            self.unregister_from_structure(id);
        }

        let realm = &mut self.realms[slot.realm];
        if slot.occupies_zone {
            if let Some(zone) = realm.zone_mut(slot.zone) {
                zone.remove(kind, id);
            }
        }
        match slot.kind {
            ObjectKind::Item => realm.remove_toplevel_item(),
            ObjectKind::Structure(_) => {
                realm.remove_structure(id);
            }
            ObjectKind::Player => realm.remove_mobile(id, WorldChangeReason::PlayerExit),
            ObjectKind::Npc => realm.remove_mobile(id, WorldChangeReason::NpcDeath),
        }
        if let Some(object) = self.objects.get_mut(&id) {
            object.in_world = false;
        }
        Ok(())
    }

    /// Re-bucket an object whose position was changed from `old_pos`.
    ///
    /// Relocates the handle only when the zone (or realm) differs; updates
    /// realm registries when the realm changed.
    pub fn move_in_world(&mut self, id: ObjectId, old_pos: Pos4d) -> Result<(), SpatialError> {
        let new_pos = self
            .objects
            .get(&id)
            .ok_or(SpatialError::UnknownObject { id })?
            .pos;
        let old = self.slot_at(id, old_pos)?;
        let new = self.slot_at(id, new_pos)?;
        let kind = new.kind.zone_kind();

        if new.occupies_zone && (old.realm, old.zone) != (new.realm, new.zone) {
            if !self.realms[old.realm]
                .zone(old.zone)
                .is_some_and(|zone| zone.contains(kind, id))
            {
                tracing::error!(
                    %id,
                    old_x = old_pos.x,
                    old_y = old_pos.y,
                    old_realm = self.realms[old.realm].name(),
                    new_x = new_pos.x,
                    new_y = new_pos.y,
                    new_realm = self.realms[new.realm].name(),
                    "move: object does not exist in its old world zone"
                );
                return Err(self.report_missing(id, kind, old.realm, old.zone, old_pos, "move"));
            }
            let target = &self.realms[new.realm];
            if target
                .zone(new.zone)
                .is_some_and(|zone| zone.contains(kind, id))
            {
                tracing::error!(
                    %id,
                    kind = kind.label(),
                    realm = target.name(),
                    zone = %new.zone,
                    "move: object already present in its new world zone"
                );
                return Err(SpatialError::AlreadyPresent {
                    id,
                    kind: kind.label(),
                    realm: target.name().to_string(),
                    zone: new.zone,
                });
            }

            if let Some(zone) = self.realms[old.realm].zone_mut(old.zone) {
                zone.remove(kind, id);
            }
            if let Some(zone) = self.realms[new.realm].zone_mut(new.zone) {
                zone.insert(kind, id);
            }
            tracing::trace!(%id, from = %old.zone, to = %new.zone, "object changed zone");
        }

        if old.realm != new.realm {
            match new.kind {
                ObjectKind::Item => {
                    self.realms[old.realm].remove_toplevel_item();
                    self.realms[new.realm].add_toplevel_item();
                }
                ObjectKind::Structure(_) => {
                    self.realms[old.realm].remove_structure(id);
                    self.realms[new.realm].add_structure(id);
                }
                ObjectKind::Player | ObjectKind::Npc => {
                    self.realms[old.realm].remove_mobile(id, WorldChangeReason::Moved);
                    self.realms[new.realm].add_mobile(id, WorldChangeReason::Moved);
                }
            }
        }

        if matches!(new.kind, ObjectKind::Item) {
            self.refresh_support(id, new_pos);
        }
        Ok(())
    }

    /// Set an object's position and re-bucket it. The position is restored if
    /// the index refuses the move.
    pub fn relocate(&mut self, id: ObjectId, new_pos: Pos4d) -> Result<(), SpatialError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(SpatialError::UnknownObject { id })?;
        let old_pos = std::mem::replace(&mut object.pos, new_pos);
        if let Err(err) = self.move_in_world(id, old_pos) {
            if let Some(object) = self.objects.get_mut(&id) {
                object.pos = old_pos;
            }
            return Err(err);
        }
        Ok(())
    }

    /// Give a player back its zone slot.
    pub fn login(&mut self, id: ObjectId) -> Result<(), SpatialError> {
        let object = self
            .objects
            .get(&id)
            .ok_or(SpatialError::UnknownObject { id })?;
        if object.logged_in || !matches!(object.kind, ObjectKind::Player) {
            return Ok(());
        }
        let pos = object.pos;
        let in_world = object.in_world;
        if in_world {
            let slot = self.slot_at(id, pos)?;
            let realm = &mut self.realms[slot.realm];
            let inserted = realm
                .zone_mut(slot.zone)
                .is_some_and(|zone| zone.insert(ZoneKind::Player, id));
            if !inserted {
                tracing::error!(
                    %id,
                    kind = ZoneKind::Player.label(),
                    realm = realm.name(),
                    zone = %slot.zone,
                    x = pos.x,
                    y = pos.y,
                    "login: player already present in world zone"
                );
                return Err(SpatialError::AlreadyPresent {
                    id,
                    kind: ZoneKind::Player.label(),
                    realm: realm.name().to_string(),
                    zone: slot.zone,
                });
            }
        }
        if let Some(object) = self.objects.get_mut(&id) {
            object.logged_in = true;
        }
        Ok(())
    }

    /// Release a player's zone slot; it stays in the realm's mobile registry.
    pub fn logout(&mut self, id: ObjectId) -> Result<(), SpatialError> {
        let object = self
            .objects
            .get(&id)
            .ok_or(SpatialError::UnknownObject { id })?;
        if !object.logged_in || !matches!(object.kind, ObjectKind::Player) {
            return Ok(());
        }
        let pos = object.pos;
        if object.in_world {
            let slot = self.slot_at(id, pos)?;
            let removed = self.realms[slot.realm]
                .zone_mut(slot.zone)
                .is_some_and(|zone| zone.remove(ZoneKind::Player, id));
            if !removed {
                return Err(self.report_missing(
                    id,
                    ZoneKind::Player,
                    slot.realm,
                    slot.zone,
                    pos,
                    "logout",
                ));
            }
        }
        if let Some(object) = self.objects.get_mut(&id) {
            object.logged_in = false;
        }
        Ok(())
    }

    fn refresh_support(&mut self, id: ObjectId, pos: Pos4d) {
        let current = self.objects.get(&id).and_then(|o| o.supporting);
        let still_supported = current.is_some_and(|structure| {
            self.objects.get(&structure).is_some_and(|s| {
                s.pos.realm == pos.realm
                    && s.footprint()
                        .is_some_and(|fp| fp.area_at(s.pos).contains(pos.xyz()))
            })
        });
        if current.is_some() && !still_supported {
            self.unregister_from_structure(id);
        }
    }

    /// Log a missing handle together with where it actually is, and build the error.
    fn report_missing(
        &self,
        id: ObjectId,
        kind: ZoneKind,
        realm: usize,
        zone: ZoneCoord,
        pos: Pos4d,
        operation: &'static str,
    ) -> SpatialError {
        let realm = &self.realms[realm];
        let found = realm.locate(kind, id);
        tracing::error!(
            operation,
            %id,
            kind = kind.label(),
            realm = realm.name(),
            zone = %zone,
            x = pos.x,
            y = pos.y,
            "object is not in its expected world zone"
        );
        for coord in &found {
            tracing::error!(operation, %id, zone = %coord, "found object in zone");
        }
        SpatialError::Missing {
            id,
            kind: kind.label(),
            realm: realm.name().to_string(),
            zone,
            pos,
            found,
        }
    }
}

use std::collections::BTreeMap;

use realmkeep_common::{GameTime, ObjectId, Pos4d, RealmId, ZoneCoord};
use realmkeep_decay::{DecayConfig, DecayRegistry, DecayStatistics};
use realmkeep_zone::{Realm, RealmConfig, RealmError};

use crate::object::{DescriptorTable, ObjectDescriptor, ObjectKind, WorldObject};
use crate::spatial::SpatialError;

/// Container chains deeper than this are treated as broken.
const MAX_CONTAINER_DEPTH: usize = 64;

/// The authoritative live-world state.
///
/// Owns the realms (and their zone grids), the object table, the descriptor
/// table and the decay registry. Nothing here is global: the simulation
/// driver owns one `WorldState` and shares it behind a single lock.
#[derive(Debug)]
pub struct WorldState {
    pub(crate) realms: Vec<Realm>,
    pub(crate) objects: BTreeMap<ObjectId, WorldObject>,
    descriptors: DescriptorTable,
    pub(crate) decay: DecayRegistry,
    pub(crate) decay_config: DecayConfig,
    pub(crate) decay_stats: DecayStatistics,
    next_serial: u64,
}

impl WorldState {
    /// Build the realms in order; realm `i` gets `RealmId(i)`.
    pub fn new(realms: &[RealmConfig], decay_config: DecayConfig) -> Result<Self, RealmError> {
        let mut built: Vec<Realm> = Vec::with_capacity(realms.len());
        for (index, config) in realms.iter().enumerate() {
            if built.iter().any(|r| r.name() == config.name) {
                return Err(RealmError::Duplicate(config.name.clone()));
            }
            built.push(Realm::new(RealmId(index as u16), config)?);
        }
        let zones: usize = built.iter().map(Realm::zone_count).sum();
        tracing::info!(realms = built.len(), zones, "world state initialized");
        Ok(Self {
            realms: built,
            objects: BTreeMap::new(),
            descriptors: DescriptorTable::new(),
            decay: DecayRegistry::new(),
            decay_config,
            decay_stats: DecayStatistics::default(),
            next_serial: 1,
        })
    }

    pub fn with_descriptors(mut self, descriptors: DescriptorTable) -> Self {
        self.descriptors = descriptors;
        self
    }

    pub fn descriptors(&self) -> &DescriptorTable {
        &self.descriptors
    }

    pub fn descriptors_mut(&mut self) -> &mut DescriptorTable {
        &mut self.descriptors
    }

    pub fn decay_config(&self) -> &DecayConfig {
        &self.decay_config
    }

    pub fn realms(&self) -> &[Realm] {
        &self.realms
    }

    pub fn realm(&self, id: RealmId) -> Option<&Realm> {
        self.realms.get(id.0 as usize)
    }

    pub fn realm_by_name(&self, name: &str) -> Option<&Realm> {
        self.realms.iter().find(|r| r.name() == name)
    }

    /// Zones across every realm.
    pub fn zone_count(&self) -> usize {
        self.realms.iter().map(Realm::zone_count).sum()
    }

    /// Next unused serial.
    pub fn allocate_id(&mut self) -> Result<ObjectId, SpatialError> {
        loop {
            let serial =
                u32::try_from(self.next_serial).map_err(|_| SpatialError::SerialsExhausted)?;
            self.next_serial += 1;
            if !self.objects.contains_key(&ObjectId(serial)) {
                return Ok(ObjectId(serial));
            }
        }
    }

    /// Put an object into the object table without placing it in the world.
    pub fn insert_object(&mut self, object: WorldObject) -> Result<ObjectId, SpatialError> {
        let id = object.id;
        if self.objects.contains_key(&id) {
            return Err(SpatialError::IdInUse { id });
        }
        self.next_serial = self.next_serial.max(u64::from(id.0) + 1);
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Insert into the object table and add to the zone index.
    pub fn spawn(&mut self, object: WorldObject) -> Result<ObjectId, SpatialError> {
        let id = self.insert_object(object)?;
        if let Err(err) = self.add(id) {
            self.objects.remove(&id);
            return Err(err);
        }
        Ok(id)
    }

    /// Create a plain movable item at `pos` and add it to the world.
    pub fn create_item(&mut self, objtype: u32, pos: Pos4d) -> Result<ObjectId, SpatialError> {
        let id = self.allocate_id()?;
        self.spawn(WorldObject::item(id, objtype, pos))
    }

    pub fn object(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut WorldObject> {
        self.objects.get_mut(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// In the table and not flagged orphan.
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.objects.get(&id).is_some_and(|o| !o.orphan)
    }

    pub fn descriptor_of(&self, id: ObjectId) -> Option<&ObjectDescriptor> {
        self.objects
            .get(&id)
            .map(|o| self.descriptors.get(o.objtype))
    }

    /// Outermost container of `id` (the object itself if it is toplevel).
    pub fn toplevel_holder(&self, id: ObjectId) -> Option<&WorldObject> {
        let mut current = self.objects.get(&id)?;
        for _ in 0..MAX_CONTAINER_DEPTH {
            match current.container {
                None => return Some(current),
                Some(parent) => current = self.objects.get(&parent)?,
            }
        }
        None
    }

    /// Realm and zone of the object's toplevel holder.
    pub fn holder_zone(&self, id: ObjectId) -> Option<(RealmId, ZoneCoord)> {
        let pos = self.toplevel_holder(id)?.pos;
        let coord = self.realm(pos.realm)?.zone_for(pos.xy())?;
        Some((pos.realm, coord))
    }

    /// Structure whose footprint covers `pos`, if any.
    pub fn find_supporting_structure(&self, pos: Pos4d) -> Option<ObjectId> {
        let realm = self.realm(pos.realm)?;
        realm.structures().find(|sid| {
            self.objects.get(sid).is_some_and(|s| {
                s.pos.realm == pos.realm
                    && s.footprint()
                        .is_some_and(|fp| fp.area_at(s.pos).contains(pos.xyz()))
            })
        })
    }

    /// Record `id` as resting on `structure`, replacing any earlier registration.
    pub fn register_with_structure(&mut self, id: ObjectId, structure: ObjectId) {
        if id == structure || !self.objects.contains_key(&id) {
            return;
        }
        self.unregister_from_structure(id);
        let Some(s) = self.objects.get_mut(&structure) else {
            return;
        };
        if !s.supported.contains(&id) {
            s.supported.push(id);
        }
        if let Some(object) = self.objects.get_mut(&id) {
            object.supporting = Some(structure);
        }
    }

    /// Detach `id` from the structure it rests on. Returns that structure.
    pub fn unregister_from_structure(&mut self, id: ObjectId) -> Option<ObjectId> {
        let structure = self.objects.get_mut(&id)?.supporting.take()?;
        if let Some(s) = self.objects.get_mut(&structure) {
            s.supported.retain(|o| *o != id);
        }
        Some(structure)
    }

    pub fn toplevel_item_count(&self) -> usize {
        self.realms.iter().map(Realm::toplevel_item_count).sum()
    }

    pub fn mobile_count(&self) -> usize {
        self.realms.iter().map(Realm::mobile_count).sum()
    }

    /// Shrink every zone list to fit.
    pub fn optimize_zones(&mut self) {
        for realm in &mut self.realms {
            realm.optimize();
        }
    }

    /// Move an item into a container. Removes it from the world and cancels its decay.
    pub fn put_in_container(
        &mut self,
        item: ObjectId,
        container: ObjectId,
    ) -> Result<(), SpatialError> {
        let object = self
            .objects
            .get(&item)
            .ok_or(SpatialError::UnknownObject { id: item })?;
        if !matches!(object.kind, ObjectKind::Item) {
            return Err(SpatialError::NotAnItem { id: item });
        }
        if !self.objects.contains_key(&container) {
            return Err(SpatialError::UnknownObject { id: container });
        }
        if self.holder_chain_contains(container, item) {
            return Err(SpatialError::ContainerCycle { id: item, container });
        }
        let (in_world, previous) = (object.in_world, object.container);
        if in_world {
            self.remove(item)?;
        } else if let Some(previous) = previous {
            self.detach_from_container(item, previous);
        }
        self.cancel(item);
        if let Some(object) = self.objects.get_mut(&item) {
            object.container = Some(container);
        }
        if let Some(parent) = self.objects.get_mut(&container) {
            parent.contents.push(item);
        }
        Ok(())
    }

    /// Drop an item at `pos`: takes it out of any container, adds it to the
    /// world, registers it with a structure underneath and schedules the
    /// descriptor's default decay.
    pub fn place_on_ground(
        &mut self,
        item: ObjectId,
        pos: Pos4d,
        now: GameTime,
    ) -> Result<(), SpatialError> {
        let object = self
            .objects
            .get(&item)
            .ok_or(SpatialError::UnknownObject { id: item })?;
        if !matches!(object.kind, ObjectKind::Item) {
            return Err(SpatialError::NotAnItem { id: item });
        }
        if object.in_world {
            self.relocate(item, pos)?;
        } else {
            let parent = object.container;
            self.ground_from_container(item, parent, pos)?;
        }
        match self.find_supporting_structure(pos) {
            Some(structure) => self.register_with_structure(item, structure),
            None => {
                self.unregister_from_structure(item);
            }
        }
        if let Some(delay) = self.descriptor_of(item).and_then(|d| d.decay_delay_secs) {
            self.schedule(item, now + delay);
        }
        Ok(())
    }

    /// Move the contents of `id` onto the ground at its holder's position.
    ///
    /// Spilled objects are registered with `support` when given and get
    /// their descriptor's default decay. On failure the unspilled remainder
    /// stays in the container.
    pub fn spill_contents(
        &mut self,
        id: ObjectId,
        support: Option<ObjectId>,
        now: GameTime,
    ) -> Result<usize, SpatialError> {
        let pos = self
            .toplevel_holder(id)
            .map(|h| h.pos)
            .ok_or(SpatialError::UnknownObject { id })?;
        let contents = match self.objects.get_mut(&id) {
            Some(object) => std::mem::take(&mut object.contents),
            None => return Err(SpatialError::UnknownObject { id }),
        };
        let mut spilled = 0;
        for (index, child) in contents.iter().copied().enumerate() {
            if let Err(err) = self.ground_from_container(child, None, pos) {
                tracing::error!(container = %id, %child, error = %err, "spill aborted");
                if let Some(object) = self.objects.get_mut(&id) {
                    object.contents.extend_from_slice(&contents[index..]);
                }
                return Err(err);
            }
            if let Some(structure) = support {
                self.register_with_structure(child, structure);
            }
            if let Some(delay) = self.descriptor_of(child).and_then(|d| d.decay_delay_secs) {
                self.schedule(child, now + delay);
            }
            spilled += 1;
        }
        tracing::debug!(container = %id, spilled, "contents spilled");
        Ok(spilled)
    }

    /// Remove an object, and anything it still contains, from the world.
    ///
    /// The zone index and the decay registry are updated before the object
    /// leaves the table. If the zone removal fails nothing is changed.
    pub fn destroy_object(&mut self, id: ObjectId) -> Result<(), SpatialError> {
        let object = self
            .objects
            .get(&id)
            .ok_or(SpatialError::UnknownObject { id })?;
        let in_world = object.in_world;
        let container = object.container;
        let contents = object.contents.clone();
        let supported = object.supported.clone();

        if in_world {
            self.remove(id)?;
        } else if let Some(parent) = container {
            self.detach_from_container(id, parent);
        }
        self.unregister_from_structure(id);
        for resting in supported {
            if let Some(o) = self.objects.get_mut(&resting) {
                o.supporting = None;
            }
        }
        self.cancel(id);
        for child in contents {
            if let Err(err) = self.destroy_object(child) {
                tracing::warn!(parent = %id, %child, error = %err, "failed to destroy contained object");
            }
        }
        self.objects.remove(&id);
        tracing::debug!(%id, "object destroyed");
        Ok(())
    }

    fn holder_chain_contains(&self, start: ObjectId, needle: ObjectId) -> bool {
        let mut current = Some(start);
        for _ in 0..MAX_CONTAINER_DEPTH {
            match current {
                Some(id) if id == needle => return true,
                Some(id) => current = self.objects.get(&id).and_then(|o| o.container),
                None => return false,
            }
        }
        true
    }

    fn detach_from_container(&mut self, id: ObjectId, parent: ObjectId) {
        if let Some(p) = self.objects.get_mut(&parent) {
            p.contents.retain(|c| *c != id);
        }
        if let Some(o) = self.objects.get_mut(&id) {
            o.container = None;
        }
    }

    /// Make a contained (or unplaced) object toplevel at `pos` and add it to
    /// the world. Restores the container link if the add fails.
    fn ground_from_container(
        &mut self,
        id: ObjectId,
        parent: Option<ObjectId>,
        pos: Pos4d,
    ) -> Result<(), SpatialError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(SpatialError::UnknownObject { id })?;
        let previous = (object.container, object.pos);
        object.container = None;
        object.pos = pos;
        match self.add(id) {
            Ok(()) => {
                if let Some(parent) = parent {
                    if let Some(p) = self.objects.get_mut(&parent) {
                        p.contents.retain(|c| *c != id);
                    }
                }
                Ok(())
            }
            Err(err) => {
                if let Some(object) = self.objects.get_mut(&id) {
                    (object.container, object.pos) = previous;
                }
                Err(err)
            }
        }
    }
}

//! Decay scheduling and the sweep.
//!
//! A sweep runs in three phases:
//! 1. snapshot the due prefix of the time index,
//! 2. classify each snapshotted object, calling policy hooks that may freely
//!    mutate the world (including other pending entries),
//! 3. reconcile the registry from the classification.
//!
//! Only phase 2 runs foreign code, and it never iterates a live index, so
//! hooks cannot invalidate the pass in progress.

use realmkeep_common::{GameTime, ObjectId, RealmId, ZoneCoord};
use realmkeep_decay::{DecayEntry, DecayRegistry, DecayStatistics, Upsert};

use crate::object::ObjectKind;
use crate::spatial::SpatialError;
use crate::world::WorldState;

/// Policy callbacks consulted before an object decays.
///
/// Both hooks run with the world lock held and receive the whole world; they
/// may schedule, cancel, move or destroy any object.
pub trait DecayHooks {
    /// Global decay permission. Returning false defers the object.
    fn can_decay(&mut self, _world: &mut WorldState, _id: ObjectId) -> bool {
        true
    }

    /// Run the descriptor's destroy script. Returning false defers the object.
    fn run_destroy_script(&mut self, _world: &mut WorldState, _script: &str, _id: ObjectId) -> bool {
        true
    }
}

impl<H: DecayHooks + ?Sized> DecayHooks for &mut H {
    fn can_decay(&mut self, world: &mut WorldState, id: ObjectId) -> bool {
        (**self).can_decay(world, id)
    }

    fn run_destroy_script(&mut self, world: &mut WorldState, script: &str, id: ObjectId) -> bool {
        (**self).run_destroy_script(world, script, id)
    }
}

/// Hooks that approve everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl DecayHooks for NoHooks {}

/// Why an object may not hold a decay entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Orphaned,
    /// Immovable and not a corpse.
    Immovable,
    /// Resting on a structure whose contents must not decay.
    OnStructure(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Orphaned,
    Cancelled,
    Ineligible,
    Deferred,
    Decay,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Entries in the snapshot.
    pub candidates: usize,
    /// Objects destroyed by decay.
    pub destroyed: usize,
    /// Orphaned handles cleaned up.
    pub orphaned: usize,
    /// Objects deferred by use, policy or script.
    pub delayed: usize,
    /// Entries dropped because the object became ineligible.
    pub removed: usize,
    /// Entries cancelled or postponed by a hook before their turn.
    pub skipped: usize,
    /// Destructions aborted by an index inconsistency.
    pub violations: Vec<SpatialError>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

impl WorldState {
    /// Whether `id` may hold a decay entry right now.
    pub fn decay_eligibility(&self, id: ObjectId) -> Eligibility {
        let Some(object) = self.objects.get(&id) else {
            return Eligibility::Orphaned;
        };
        if object.orphan {
            return Eligibility::Orphaned;
        }
        let descriptor = self.descriptors().get(object.objtype);
        if !object.movable && !descriptor.corpse {
            return Eligibility::Immovable;
        }
        if !descriptor.decays_on_structures {
            let pos = self.toplevel_holder(id).map_or(object.pos, |h| h.pos);
            if let Some(structure) = self
                .find_supporting_structure(pos)
                .filter(|s| *s != id)
            {
                return Eligibility::OnStructure(structure);
            }
        }
        Eligibility::Eligible
    }

    /// Schedule (or reschedule) `id` to decay at `time`.
    ///
    /// Ineligible objects are ignored. Returns whether the object is now scheduled.
    pub fn schedule(&mut self, id: ObjectId, time: GameTime) -> bool {
        let eligibility = self.decay_eligibility(id);
        if eligibility != Eligibility::Eligible {
            tracing::trace!(%id, ?eligibility, "decay not scheduled");
            return false;
        }
        match self.decay.upsert(id, time) {
            Upsert::Inserted => {
                if let Some(object) = self.objects.get_mut(&id) {
                    object.has_decay_task = true;
                }
                tracing::trace!(%id, time, "decay scheduled");
            }
            Upsert::Updated { previous } => {
                tracing::trace!(%id, previous, time, "decay rescheduled");
            }
            Upsert::Unchanged => {}
        }
        true
    }

    /// Drop any pending decay for `id`. Returns whether there was one.
    pub fn cancel(&mut self, id: ObjectId) -> bool {
        let removed = self.decay.remove(id).is_some();
        if let Some(object) = self.objects.get_mut(&id) {
            object.has_decay_task = false;
        }
        removed
    }

    /// Scheduled decay time, or `None` if nothing is pending.
    pub fn expiry_of(&self, id: ObjectId) -> Option<GameTime> {
        if !self.objects.get(&id)?.has_decay_task {
            return None;
        }
        self.decay.get(id)
    }

    pub fn decay_registry(&self) -> &DecayRegistry {
        &self.decay
    }

    pub fn decay_statistics(&self) -> &DecayStatistics {
        &self.decay_stats
    }

    pub fn decay_statistics_mut(&mut self) -> &mut DecayStatistics {
        &mut self.decay_stats
    }

    /// Evaluate every entry due at `now`.
    pub fn sweep(&mut self, now: GameTime, hooks: &mut dyn DecayHooks) -> SweepReport {
        let _span = tracing::debug_span!("decay_sweep", now).entered();
        let snapshot: Vec<DecayEntry> = self.decay.due(now).collect();
        self.process_snapshot(snapshot, now, hooks)
    }

    /// Evaluate the entries due at `now` whose objects lie in one zone.
    ///
    /// Objects inside containers count as being where their outermost
    /// container is. Entries that resolve to no zone (orphans, broken
    /// container chains) are taken by whichever zone sweep reaches them
    /// first. Also feeds the zone's decay-active item count into
    /// the statistics cycle.
    pub fn sweep_zone(
        &mut self,
        realm: RealmId,
        zone: ZoneCoord,
        now: GameTime,
        hooks: &mut dyn DecayHooks,
    ) -> SweepReport {
        let _span = tracing::debug_span!("decay_sweep_zone", %realm, %zone, now).entered();

        if self.decay_config.statistics {
            let active = self
                .realm(realm)
                .and_then(|r| r.zone(zone))
                .map_or(0, |z| {
                    z.items
                        .iter()
                        .filter(|id| self.objects.get(*id).is_some_and(|o| o.has_decay_task))
                        .count()
                });
            self.decay_stats.record_active(active as u64);
        }

        let snapshot: Vec<DecayEntry> = self
            .decay
            .due(now)
            .filter(|entry| match self.holder_zone(entry.object) {
                Some(location) => location == (realm, zone),
                None => {
                    if self.is_live(entry.object) {
                        tracing::warn!(
                            id = %entry.object,
                            scheduled = entry.time,
                            "due object has no holder zone, sweeping it here"
                        );
                    }
                    true
                }
            })
            .collect();
        self.process_snapshot(snapshot, now, hooks)
    }

    fn process_snapshot(
        &mut self,
        snapshot: Vec<DecayEntry>,
        now: GameTime,
        hooks: &mut dyn DecayHooks,
    ) -> SweepReport {
        let mut report = SweepReport {
            candidates: snapshot.len(),
            ..SweepReport::default()
        };
        if snapshot.is_empty() {
            return report;
        }

        let mut finished: Vec<ObjectId> = Vec::new();
        let mut dropped: Vec<ObjectId> = Vec::new();
        let mut delayed: Vec<ObjectId> = Vec::new();

        for entry in &snapshot {
            let id = entry.object;
            match self.classify(id, now, hooks) {
                Verdict::Orphaned => {
                    report.orphaned += 1;
                    finished.push(id);
                }
                Verdict::Cancelled => report.skipped += 1,
                Verdict::Ineligible => {
                    report.removed += 1;
                    dropped.push(id);
                }
                Verdict::Deferred => delayed.push(id),
                Verdict::Decay => match self.decay_object(id, now) {
                    Ok(()) => {
                        report.destroyed += 1;
                        finished.push(id);
                    }
                    Err(err) => {
                        tracing::error!(%id, scheduled = entry.time, error = %err, "decay aborted");
                        report.violations.push(err);
                        delayed.push(id);
                    }
                },
            }
        }

        for id in finished {
            self.cancel(id);
        }
        for id in dropped {
            // A later hook may have made it eligible again and rescheduled it.
            if self.decay.get(id).is_none_or(|t| t <= now) {
                self.cancel(id);
            }
        }
        let retry_at = now + self.decay_config.cooldown_secs;
        for id in delayed {
            // A hook may already have pushed the expiry past this sweep.
            if self.expiry_of(id).is_some_and(|t| t > now) || self.schedule(id, retry_at) {
                report.delayed += 1;
                continue;
            }
            // Made ineligible (or destroyed) by a hook while deferred.
            self.cancel(id);
            if self.is_live(id) {
                report.removed += 1;
            } else {
                report.orphaned += 1;
            }
        }

        if self.decay_config.statistics {
            self.decay_stats.record_decayed(report.destroyed as u64);
        }
        tracing::debug!(
            candidates = report.candidates,
            destroyed = report.destroyed,
            delayed = report.delayed,
            orphaned = report.orphaned,
            removed = report.removed,
            skipped = report.skipped,
            "decay sweep complete"
        );
        report
    }

    fn classify(&mut self, id: ObjectId, now: GameTime, hooks: &mut dyn DecayHooks) -> Verdict {
        let Some(object) = self.objects.get(&id) else {
            return Verdict::Orphaned;
        };
        if object.orphan {
            return Verdict::Orphaned;
        }
        // Cancelled, or pushed past this sweep, by an earlier hook.
        if !object.has_decay_task || self.decay.get(id).is_none_or(|t| t > now) {
            return Verdict::Cancelled;
        }
        let in_use = object.in_use;
        match self.decay_eligibility(id) {
            Eligibility::Eligible => {}
            Eligibility::Orphaned => return Verdict::Orphaned,
            Eligibility::Immovable | Eligibility::OnStructure(_) => return Verdict::Ineligible,
        }
        if in_use {
            return Verdict::Deferred;
        }

        if !hooks.can_decay(self, id) {
            return Verdict::Deferred;
        }
        if !self.is_live(id) {
            return Verdict::Orphaned;
        }

        let script = self
            .descriptor_of(id)
            .and_then(|d| d.destroy_script.clone());
        if let Some(script) = script {
            if !hooks.run_destroy_script(self, &script, id) {
                return Verdict::Deferred;
            }
            if !self.is_live(id) {
                return Verdict::Orphaned;
            }
        }
        Verdict::Decay
    }

    /// Spill contents (onto the supporting structure when the descriptor
    /// allows it) and destroy.
    fn decay_object(&mut self, id: ObjectId, now: GameTime) -> Result<(), SpatialError> {
        let (pos, has_contents, decays_on_structures) = {
            let object = self
                .objects
                .get(&id)
                .ok_or(SpatialError::UnknownObject { id })?;
            let descriptor = self.descriptors().get(object.objtype);
            let pos = self.toplevel_holder(id).map_or(object.pos, |h| h.pos);
            (
                pos,
                !object.contents.is_empty(),
                descriptor.decays_on_structures,
            )
        };
        if has_contents {
            let support = if decays_on_structures {
                self.find_supporting_structure(pos).filter(|s| *s != id)
            } else {
                None
            };
            self.spill_contents(id, support, now)?;
        }
        let kind = self.objects.get(&id).map(|o| o.kind);
        self.destroy_object(id)?;
        tracing::trace!(%id, kind = kind.map(ObjectKind::label), "object decayed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{DescriptorTable, Footprint, ObjectDescriptor, WorldObject};
    use realmkeep_common::Pos4d;
    use realmkeep_decay::DecayConfig;
    use realmkeep_zone::RealmConfig;

    const PLAIN: u32 = 0x0001;
    const SCRIPTED: u32 = 0x0002;
    const CORPSE: u32 = 0x2006;
    const ROOFTOP: u32 = 0x0003;
    const HOUSE: u32 = 0x6000;

    fn world() -> WorldState {
        let realms = [RealmConfig {
            name: "test".to_string(),
            width: 512,
            height: 512,
        }];
        let descriptors: DescriptorTable = [
            ObjectDescriptor {
                objtype: SCRIPTED,
                destroy_script: Some("misc/ondestroy".to_string()),
                ..ObjectDescriptor::default()
            },
            ObjectDescriptor {
                objtype: CORPSE,
                corpse: true,
                ..ObjectDescriptor::default()
            },
            ObjectDescriptor {
                objtype: ROOFTOP,
                decays_on_structures: true,
                ..ObjectDescriptor::default()
            },
        ]
        .into_iter()
        .collect();
        WorldState::new(&realms, DecayConfig::default())
            .unwrap()
            .with_descriptors(descriptors)
    }

    fn at(x: u16, y: u16) -> Pos4d {
        Pos4d::new(x, y, 0, RealmId(0))
    }

    fn add_house(w: &mut WorldState, x: u16, y: u16) -> ObjectId {
        let id = w.allocate_id().unwrap();
        w.spawn(WorldObject::structure(
            id,
            HOUSE,
            at(x, y),
            Footprint::square(5, 20),
        ))
        .unwrap()
    }

    /// Scripted answers plus an optional side effect run from `can_decay`.
    #[derive(Default)]
    struct ScriptedHooks {
        allow: bool,
        script_result: bool,
        calls: Vec<ObjectId>,
        on_can_decay: Option<Box<dyn FnMut(&mut WorldState, ObjectId)>>,
    }

    impl ScriptedHooks {
        fn allowing() -> Self {
            Self {
                allow: true,
                script_result: true,
                ..Self::default()
            }
        }
    }

    impl DecayHooks for ScriptedHooks {
        fn can_decay(&mut self, world: &mut WorldState, id: ObjectId) -> bool {
            self.calls.push(id);
            if let Some(effect) = self.on_can_decay.as_mut() {
                effect(world, id);
            }
            self.allow
        }

        fn run_destroy_script(&mut self, _world: &mut WorldState, _script: &str, _id: ObjectId) -> bool {
            self.script_result
        }
    }

    #[test]
    fn schedule_twice_keeps_one_entry() {
        let mut w = world();
        let id = w.create_item(PLAIN, at(10, 10)).unwrap();
        assert!(w.schedule(id, 100));
        assert!(w.schedule(id, 100));
        assert_eq!(w.decay_registry().len(), 1);
        assert_eq!(w.expiry_of(id), Some(100));
        assert!(w.schedule(id, 150));
        assert_eq!(w.decay_registry().len(), 1);
        assert_eq!(w.expiry_of(id), Some(150));
    }

    #[test]
    fn cancel_without_entry_is_noop() {
        let mut w = world();
        let id = w.create_item(PLAIN, at(10, 10)).unwrap();
        assert!(!w.cancel(id));
        assert!(!w.cancel(ObjectId(999)));
        w.schedule(id, 100);
        assert!(w.cancel(id));
        assert_eq!(w.expiry_of(id), None);
        assert!(!w.object(id).unwrap().has_decay_task());
        assert!(w.decay_registry().is_empty());
    }

    #[test]
    fn ineligible_objects_are_not_scheduled() {
        let mut w = world();
        let fixed = w.allocate_id().unwrap();
        w.spawn(WorldObject::item(fixed, PLAIN, at(10, 10)).with_movable(false))
            .unwrap();
        assert!(!w.schedule(fixed, 100));
        assert_eq!(w.decay_eligibility(fixed), Eligibility::Immovable);

        let corpse = w.allocate_id().unwrap();
        w.spawn(WorldObject::item(corpse, CORPSE, at(10, 10)).with_movable(false))
            .unwrap();
        assert!(w.schedule(corpse, 100));

        assert!(!w.schedule(ObjectId(4242), 100));
        assert_eq!(w.decay_registry().len(), 1);
    }

    #[test]
    fn structures_block_decay_unless_descriptor_allows() {
        let mut w = world();
        let house = add_house(&mut w, 100, 100);
        let plain = w.create_item(PLAIN, at(101, 101)).unwrap();
        let rooftop = w.create_item(ROOFTOP, at(102, 102)).unwrap();
        assert_eq!(w.decay_eligibility(plain), Eligibility::OnStructure(house));
        assert!(!w.schedule(plain, 100));
        assert!(w.schedule(rooftop, 100));
    }

    #[test]
    fn expiry_uses_pending_flag_fast_path() {
        let mut w = world();
        let id = w.create_item(PLAIN, at(10, 10)).unwrap();
        w.schedule(id, 100);
        w.object_mut(id).unwrap().has_decay_task = false;
        assert_eq!(w.expiry_of(id), None);
    }

    #[test]
    fn due_object_without_hooks_is_destroyed() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        w.schedule(a, 100);

        let report = w.sweep(100, &mut NoHooks);
        assert_eq!(report.destroyed, 1);
        assert!(report.is_clean());
        assert!(w.object(a).is_none());
        assert_eq!(w.expiry_of(a), None);
        assert!(w.decay_registry().is_empty());
        assert!(w.integrity_check().is_ok());
    }

    #[test]
    fn refused_destroy_script_applies_cooldown() {
        let mut w = world();
        let b = w.create_item(SCRIPTED, at(10, 10)).unwrap();
        w.schedule(b, 100);

        let mut hooks = ScriptedHooks {
            allow: true,
            script_result: false,
            ..ScriptedHooks::default()
        };
        let report = w.sweep(100, &mut hooks);
        assert_eq!(report.delayed, 1);
        assert!(w.object(b).is_some());
        assert_eq!(w.expiry_of(b), Some(700));
        assert_eq!(w.decay_registry().len(), 1);
    }

    #[test]
    fn policy_refusal_and_in_use_defer() {
        let mut w = world();
        let busy = w.create_item(PLAIN, at(10, 10)).unwrap();
        let refused = w.create_item(PLAIN, at(20, 20)).unwrap();
        w.object_mut(busy).unwrap().in_use = true;
        w.schedule(busy, 50);
        w.schedule(refused, 60);

        let mut hooks = ScriptedHooks::default();
        let report = w.sweep(100, &mut hooks);
        assert_eq!(report.delayed, 2);
        // The in-use object never reaches the policy hook.
        assert_eq!(hooks.calls, vec![refused]);
        assert_eq!(w.expiry_of(busy), Some(700));
        assert_eq!(w.expiry_of(refused), Some(700));
    }

    #[test]
    fn future_entries_are_untouched() {
        let mut w = world();
        let early = w.create_item(PLAIN, at(10, 10)).unwrap();
        let late = w.create_item(PLAIN, at(11, 11)).unwrap();
        w.schedule(early, 100);
        w.schedule(late, 101);
        let report = w.sweep(100, &mut NoHooks);
        assert_eq!(report.candidates, 1);
        assert_eq!(w.expiry_of(late), Some(101));
    }

    #[test]
    fn hook_rescheduling_another_object_does_not_pull_it_into_the_pass() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        let c = w.create_item(PLAIN, at(12, 12)).unwrap();
        w.schedule(a, 100);
        w.schedule(c, 5_000);

        let mut hooks = ScriptedHooks::allowing();
        hooks.on_can_decay = Some(Box::new(move |world: &mut WorldState, id: ObjectId| {
            if id == a {
                world.schedule(c, 50);
            }
        }));
        let report = w.sweep(100, &mut hooks);
        assert_eq!(report.candidates, 1);
        assert_eq!(hooks.calls, vec![a]);
        assert!(w.object(c).is_some());
        assert_eq!(w.expiry_of(c), Some(50));
    }

    #[test]
    fn hook_cancelling_a_later_candidate_skips_it() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        let c = w.create_item(PLAIN, at(12, 12)).unwrap();
        w.schedule(a, 90);
        w.schedule(c, 95);

        let mut hooks = ScriptedHooks::allowing();
        hooks.on_can_decay = Some(Box::new(move |world: &mut WorldState, id: ObjectId| {
            if id == a {
                world.cancel(c);
            }
        }));
        let report = w.sweep(100, &mut hooks);
        assert_eq!(report.destroyed, 1);
        assert_eq!(report.skipped, 1);
        assert!(w.object(c).is_some());
        assert_eq!(w.expiry_of(c), None);
    }

    #[test]
    fn hook_destroying_a_later_candidate_is_cleaned_up() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        let c = w.create_item(PLAIN, at(12, 12)).unwrap();
        w.schedule(a, 90);
        w.schedule(c, 95);

        let mut hooks = ScriptedHooks::allowing();
        hooks.on_can_decay = Some(Box::new(move |world: &mut WorldState, id: ObjectId| {
            if id == a {
                world.destroy_object(c).unwrap();
            }
        }));
        let report = w.sweep(100, &mut hooks);
        assert_eq!(report.destroyed, 1);
        assert_eq!(report.orphaned, 1);
        assert!(w.decay_registry().is_empty());
        assert!(w.integrity_check().is_ok());
    }

    #[test]
    fn hook_postponing_a_later_candidate_skips_it() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        let c = w.create_item(PLAIN, at(12, 12)).unwrap();
        w.schedule(a, 90);
        w.schedule(c, 95);

        let mut hooks = ScriptedHooks::allowing();
        hooks.on_can_decay = Some(Box::new(move |world: &mut WorldState, id: ObjectId| {
            if id == a {
                world.schedule(c, 5_000);
            }
        }));
        let report = w.sweep(100, &mut hooks);
        assert_eq!(report.skipped, 1);
        assert_eq!(hooks.calls, vec![a]);
        assert_eq!(w.expiry_of(c), Some(5_000));
    }

    #[test]
    fn hook_pushing_own_expiry_forward_is_respected() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        w.schedule(a, 100);

        let mut hooks = ScriptedHooks::default();
        hooks.on_can_decay = Some(Box::new(|world: &mut WorldState, id: ObjectId| {
            world.schedule(id, 5_000);
        }));
        w.sweep(100, &mut hooks);
        assert_eq!(w.expiry_of(a), Some(5_000));
    }

    #[test]
    fn object_made_immovable_is_dropped_not_destroyed() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        w.schedule(a, 100);
        w.object_mut(a).unwrap().movable = false;

        let report = w.sweep(100, &mut NoHooks);
        assert_eq!(report.removed, 1);
        assert!(w.object(a).is_some());
        assert_eq!(w.expiry_of(a), None);
    }

    #[test]
    fn deferred_object_made_immovable_by_its_hook_is_dropped() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        w.schedule(a, 100);

        let mut hooks = ScriptedHooks::default();
        hooks.on_can_decay = Some(Box::new(|world: &mut WorldState, id: ObjectId| {
            world.object_mut(id).unwrap().movable = false;
        }));
        let report = w.sweep(100, &mut hooks);
        assert_eq!(report.delayed, 0);
        assert_eq!(report.removed, 1);
        assert!(w.object(a).is_some());
        assert_eq!(w.expiry_of(a), None);
        assert!(w.decay_registry().is_empty());
        assert_eq!(w.decay_registry().due(100).count(), 0);
    }

    #[test]
    fn deferred_object_destroyed_by_its_hook_counts_as_orphaned() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        w.schedule(a, 100);

        let mut hooks = ScriptedHooks::default();
        hooks.on_can_decay = Some(Box::new(|world: &mut WorldState, id: ObjectId| {
            world.destroy_object(id).unwrap();
        }));
        let report = w.sweep(100, &mut hooks);
        assert_eq!(report.delayed, 0);
        assert_eq!(report.orphaned, 1);
        assert!(w.decay_registry().is_empty());
        assert!(w.integrity_check().is_ok());
    }

    #[test]
    fn dropped_object_rescheduled_by_a_later_hook_keeps_its_entry() {
        let mut w = world();
        let x = w.create_item(PLAIN, at(10, 10)).unwrap();
        let a = w.create_item(PLAIN, at(12, 12)).unwrap();
        w.schedule(x, 90);
        w.schedule(a, 95);
        w.object_mut(x).unwrap().movable = false;

        let mut hooks = ScriptedHooks::allowing();
        hooks.on_can_decay = Some(Box::new(move |world: &mut WorldState, id: ObjectId| {
            if id == a {
                world.object_mut(x).unwrap().movable = true;
                assert!(world.schedule(x, 5_000));
            }
        }));
        let report = w.sweep(100, &mut hooks);
        assert_eq!(report.removed, 1);
        assert_eq!(report.destroyed, 1);
        assert!(w.object(x).is_some());
        assert_eq!(w.expiry_of(x), Some(5_000));
        assert!(w.decay_registry().is_consistent());
    }

    #[test]
    fn orphaned_entries_are_cleaned_up() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        w.schedule(a, 100);
        w.object_mut(a).unwrap().orphan = true;

        let report = w.sweep(100, &mut NoHooks);
        assert_eq!(report.orphaned, 1);
        assert!(w.decay_registry().is_empty());
    }

    #[test]
    fn decaying_container_spills_onto_supporting_structure() {
        let mut w = world();
        let house = add_house(&mut w, 100, 100);
        let chest = w.create_item(ROOFTOP, at(101, 101)).unwrap();
        let gem = w.create_item(PLAIN, at(0, 0)).unwrap();
        w.put_in_container(gem, chest).unwrap();
        assert!(w.schedule(chest, 100));

        let report = w.sweep(100, &mut NoHooks);
        assert_eq!(report.destroyed, 1);
        assert!(w.object(chest).is_none());
        let gem_obj = w.object(gem).unwrap();
        assert!(gem_obj.in_world());
        assert_eq!(gem_obj.pos, at(101, 101));
        assert_eq!(gem_obj.supporting(), Some(house));
        assert!(w.integrity_check().is_ok());
    }

    #[test]
    fn zone_sweep_only_touches_its_zone() {
        let mut w = world();
        let here = w.create_item(PLAIN, at(10, 10)).unwrap();
        let there = w.create_item(PLAIN, at(100, 10)).unwrap();
        let bag = w.create_item(PLAIN, at(20, 20)).unwrap();
        let inside = w.create_item(PLAIN, at(300, 300)).unwrap();
        w.put_in_container(inside, bag).unwrap();
        for id in [here, there, inside] {
            w.schedule(id, 100);
        }

        let report = w.sweep_zone(RealmId(0), ZoneCoord::new(0, 0), 100, &mut NoHooks);
        assert_eq!(report.destroyed, 2);
        assert!(w.object(here).is_none());
        assert!(w.object(inside).is_none());
        assert_eq!(w.expiry_of(there), Some(100));
        assert!(w.object(bag).unwrap().contents.is_empty());
    }

    #[test]
    fn zone_sweep_takes_objects_with_a_broken_container_chain() {
        let mut w = world();
        let bag = w.create_item(PLAIN, at(300, 300)).unwrap();
        let coin = w.create_item(PLAIN, at(300, 300)).unwrap();
        w.put_in_container(coin, bag).unwrap();
        assert!(w.schedule(coin, 100));
        w.object_mut(coin).unwrap().container = Some(ObjectId(999));
        assert_eq!(w.holder_zone(coin), None);

        let report = w.sweep_zone(RealmId(0), ZoneCoord::new(0, 0), 100, &mut NoHooks);
        assert_eq!(report.candidates, 1);
        assert_eq!(report.destroyed, 1);
        assert!(w.object(coin).is_none());
        assert!(w.decay_registry().is_empty());
    }

    #[test]
    fn zone_sweep_feeds_statistics() {
        let mut w = world();
        let a = w.create_item(PLAIN, at(10, 10)).unwrap();
        let b = w.create_item(PLAIN, at(11, 11)).unwrap();
        w.create_item(PLAIN, at(12, 12)).unwrap();
        w.schedule(a, 100);
        w.schedule(b, 900);

        w.sweep_zone(RealmId(0), ZoneCoord::new(0, 0), 100, &mut NoHooks);
        assert_eq!(w.decay_statistics().cycle_counts(), (1, 2));
    }
}

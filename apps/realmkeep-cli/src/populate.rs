use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use realmkeep_common::{GameTime, ObjectId, Pos4d, RealmId};
use realmkeep_kernel::{DecayHooks, Footprint, SpatialError, WorldObject, WorldState};
use serde::Serialize;

use crate::config::{BACKPACK, BLOOD, CORPSE, GOLD};

const HOUSE: u32 = 0x6000;
const ORC: u32 = 0x0011;
const HUMAN_MALE: u32 = 0x0190;

/// What [`populate`] created.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Population {
    pub structures: usize,
    pub items: usize,
    pub contained: usize,
    pub npcs: usize,
    pub players: usize,
    pub scheduled: usize,
}

/// Scatter a deterministic random population over every realm.
///
/// Roughly one structure per 200 items, one npc per 50 and one player per
/// 100 (half of them logged out). Every toplevel item is scheduled to decay
/// somewhere in `now..now + horizon`.
pub fn populate(
    world: &mut WorldState,
    seed: u64,
    items: usize,
    now: GameTime,
    horizon: GameTime,
) -> Result<Population, SpatialError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let maps: Vec<(RealmId, u16, u16)> = world
        .realms()
        .iter()
        .map(|r| (r.id(), r.width(), r.height()))
        .collect();
    let mut population = Population::default();
    if maps.is_empty() {
        return Ok(population);
    }
    let random_pos = |rng: &mut StdRng| {
        let (realm, width, height) = maps[rng.gen_range(0..maps.len())];
        Pos4d::new(
            rng.gen_range(0..width),
            rng.gen_range(0..height),
            0,
            realm,
        )
    };

    for _ in 0..items / 200 {
        let id = world.allocate_id()?;
        let footprint = Footprint::square(rng.gen_range(2..8), 20);
        world.spawn(WorldObject::structure(id, HOUSE, random_pos(&mut rng), footprint))?;
        population.structures += 1;
    }

    let mut toplevel: Vec<ObjectId> = Vec::with_capacity(items);
    let mut backpacks: Vec<ObjectId> = Vec::new();
    for _ in 0..items {
        let objtype = match rng.gen_range(0..10) {
            0..=4 => GOLD,
            5 | 6 => BACKPACK,
            7 | 8 => BLOOD,
            _ => CORPSE,
        };
        let id = world.allocate_id()?;
        let mut item = WorldObject::item(id, objtype, random_pos(&mut rng));
        if objtype == CORPSE {
            item = item.with_movable(false);
        }
        if matches!(objtype, GOLD | BLOOD) && !backpacks.is_empty() && rng.gen_bool(0.2) {
            world.insert_object(item)?;
            let bag = backpacks[rng.gen_range(0..backpacks.len())];
            world.put_in_container(id, bag)?;
            population.contained += 1;
        } else {
            world.spawn(item)?;
            toplevel.push(id);
            if objtype == BACKPACK {
                backpacks.push(id);
            }
        }
        population.items += 1;
    }

    for _ in 0..items / 50 {
        let id = world.allocate_id()?;
        world.spawn(WorldObject::npc(id, ORC, random_pos(&mut rng)))?;
        population.npcs += 1;
    }
    for i in 0..items / 100 {
        let id = world.allocate_id()?;
        world.spawn(WorldObject::player(id, HUMAN_MALE, random_pos(&mut rng)))?;
        if i % 2 == 1 {
            world.logout(id)?;
        }
        population.players += 1;
    }

    for id in toplevel {
        if world.schedule(id, now + rng.gen_range(0..horizon.max(1))) {
            population.scheduled += 1;
        }
    }
    tracing::info!(
        seed,
        items = population.items,
        structures = population.structures,
        scheduled = population.scheduled,
        "world populated"
    );
    Ok(population)
}

/// Decay policy for simulations: some object types never decay and destroy
/// scripts refuse at a fixed rate.
pub struct SimHooks {
    protected: HashSet<u32>,
    script_refusal: f64,
    rng: StdRng,
    pub refused: u64,
    pub scripts_run: u64,
}

impl SimHooks {
    pub fn new(seed: u64, protected: impl IntoIterator<Item = u32>, script_refusal: f64) -> Self {
        Self {
            protected: protected.into_iter().collect(),
            script_refusal: script_refusal.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
            refused: 0,
            scripts_run: 0,
        }
    }
}

impl DecayHooks for SimHooks {
    fn can_decay(&mut self, world: &mut WorldState, id: ObjectId) -> bool {
        let allowed = world
            .object(id)
            .is_some_and(|o| !self.protected.contains(&o.objtype));
        if !allowed {
            self.refused += 1;
        }
        allowed
    }

    fn run_destroy_script(&mut self, _world: &mut WorldState, script: &str, id: ObjectId) -> bool {
        self.scripts_run += 1;
        let approved = !self.rng.gen_bool(self.script_refusal);
        tracing::trace!(%id, script, approved, "destroy script");
        approved
    }
}

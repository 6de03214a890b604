use std::collections::{BTreeSet, HashMap};

use realmkeep_common::{GameTime, ObjectId};

/// A pending expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayEntry {
    pub time: GameTime,
    pub object: ObjectId,
}

/// Outcome of [`DecayRegistry::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated { previous: GameTime },
    Unchanged,
}

/// Expiry store indexed two ways.
///
/// `by_object` answers "is this object pending, and when" in O(1); `by_time`
/// keeps entries ordered by `(time, id)` so due entries are a prefix scan.
/// Every mutation touches both.
#[derive(Debug, Clone, Default)]
pub struct DecayRegistry {
    by_object: HashMap<ObjectId, GameTime>,
    by_time: BTreeSet<(GameTime, ObjectId)>,
}

impl DecayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, or move the existing entry for `object` to `time`.
    pub fn upsert(&mut self, object: ObjectId, time: GameTime) -> Upsert {
        match self.by_object.insert(object, time) {
            None => {
                self.by_time.insert((time, object));
                Upsert::Inserted
            }
            Some(previous) if previous == time => Upsert::Unchanged,
            Some(previous) => {
                self.by_time.remove(&(previous, object));
                self.by_time.insert((time, object));
                Upsert::Updated { previous }
            }
        }
    }

    /// Drop the entry for `object`, returning its expiry if there was one.
    pub fn remove(&mut self, object: ObjectId) -> Option<GameTime> {
        let time = self.by_object.remove(&object)?;
        self.by_time.remove(&(time, object));
        Some(time)
    }

    pub fn get(&self, object: ObjectId) -> Option<GameTime> {
        self.by_object.get(&object).copied()
    }

    pub fn contains(&self, object: ObjectId) -> bool {
        self.by_object.contains_key(&object)
    }

    pub fn len(&self) -> usize {
        self.by_object.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_object.is_empty()
    }

    /// Entries with `time <= now`, earliest first. Stops at the first later entry.
    pub fn due(&self, now: GameTime) -> impl Iterator<Item = DecayEntry> + '_ {
        self.by_time
            .iter()
            .take_while(move |(time, _)| *time <= now)
            .map(|&(time, object)| DecayEntry { time, object })
    }

    /// All entries, earliest first.
    pub fn iter(&self) -> impl Iterator<Item = DecayEntry> + '_ {
        self.by_time
            .iter()
            .map(|&(time, object)| DecayEntry { time, object })
    }

    pub fn next_expiry(&self) -> Option<DecayEntry> {
        self.iter().next()
    }

    /// Whether both indices agree entry for entry.
    pub fn is_consistent(&self) -> bool {
        self.by_object.len() == self.by_time.len()
            && self
                .by_time
                .iter()
                .all(|(time, object)| self.by_object.get(object) == Some(time))
    }
}

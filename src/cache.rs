use std::collections::HashMap;

use crate::models::{Rank, RoundInformation, Tick};

/// Sparse per-subject store of ranking snapshots keyed by tick. Absence
/// means "not yet fetched", not "zero score". Entries are never evicted and
/// never mutated after insertion; a competition has finitely many ticks.
#[derive(Debug, Default)]
pub struct TickCache {
    entries: HashMap<Tick, Rank>,
}

impl TickCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, tick: Tick) -> bool {
        self.entries.contains_key(&tick)
    }

    pub fn get(&self, tick: Tick) -> Option<&Rank> {
        self.entries.get(&tick)
    }

    /// Idempotent insert. A tick's ranking is immutable once it exists, so
    /// the first write wins and repeats are no-ops.
    pub fn put(&mut self, tick: Tick, rank: Rank) {
        self.entries.entry(tick).or_insert(rank);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Extract the subject's row from a full round table, if present, and
    /// cache it. A subject absent from the table is not an error; the tick
    /// simply stays unpopulated.
    pub fn merge_round(&mut self, info: &RoundInformation, subject_id: u32) -> bool {
        let Some(rank) = info.scoreboard.iter().find(|r| r.team_id == subject_id) else {
            return false;
        };
        self.put(info.tick, rank.clone());
        true
    }

    /// The store itself is unordered; callers wanting newest-first rows sort
    /// here explicitly.
    pub fn ticks_desc(&self) -> Vec<Tick> {
        let mut ticks: Vec<Tick> = self.entries.keys().copied().collect();
        ticks.sort_unstable_by(|a, b| b.cmp(a));
        ticks
    }
}

//! Fixed-capacity label position store with recency-based eviction.
//!
//! The store maps label ids to committed byte positions. It is a fixed slot
//! table rather than a map: 32 slots, linear scan, and eviction of the slot
//! with the lowest generation when full. The generation counter is global to
//! the run and bumps once per committed write, so "lowest generation" is
//! exactly "least recently committed".

use crate::program::LabelId;

/// Number of slots in the store.
pub const LABEL_SLOTS: usize = 32;

#[derive(Clone, Copy, Debug)]
struct Slot {
    name: LabelId,
    pos: i64,
    generation: u64,
    in_use: bool,
}

const EMPTY_SLOT: Slot = Slot {
    name: LabelId(0),
    pos: 0,
    generation: 0,
    in_use: false,
};

/// Committed label positions. Updated only by clause commit.
#[derive(Clone, Debug)]
pub struct LabelStore {
    slots: [Slot; LABEL_SLOTS],
    generation: u64,
}

impl Default for LabelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelStore {
    pub fn new() -> Self {
        LabelStore {
            slots: [EMPTY_SLOT; LABEL_SLOTS],
            generation: 0,
        }
    }

    /// Committed position for `name`, if any.
    pub fn get(&self, name: LabelId) -> Option<i64> {
        self.slots
            .iter()
            .find(|s| s.in_use && s.name == name)
            .map(|s| s.pos)
    }

    /// Commit one label write.
    ///
    /// Overwrites an existing entry for the same name, otherwise takes a free
    /// slot, otherwise evicts the least recently committed entry. Bumps the
    /// generation counter exactly once.
    pub fn commit(&mut self, name: LabelId, pos: i64) {
        self.generation += 1;
        let generation = self.generation;

        let mut free: Option<usize> = None;
        let mut oldest = 0usize;
        for i in 0..LABEL_SLOTS {
            if !self.slots[i].in_use {
                if free.is_none() {
                    free = Some(i);
                }
                continue;
            }
            if self.slots[i].name == name {
                self.slots[i].pos = pos;
                self.slots[i].generation = generation;
                return;
            }
            if self.slots[i].generation < self.slots[oldest].generation || !self.slots[oldest].in_use
            {
                oldest = i;
            }
        }

        let idx = free.unwrap_or(oldest);
        self.slots[idx] = Slot {
            name,
            pos,
            generation,
            in_use: true,
        };
    }

    /// Current generation counter (monotonic across the run).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.in_use).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

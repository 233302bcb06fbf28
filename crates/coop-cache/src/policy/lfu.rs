use std::{
    collections::{BTreeMap, HashMap},
    num::NonZeroUsize,
};

use crate::{
    key::ContentKey,
    policy::{CachePolicy, PolicyKind},
};

#[derive(Clone, Copy)]
struct Slot {
    score: u64,
    /// Admission order, fixed for the lifetime of the entry.
    seq: u64,
}

/// Score bookkeeping shared by the frequency policies.
///
/// The victim is the key with the lowest score; among equal scores, the one
/// admitted first. `order` mirrors `slots` so the victim is the first entry of
/// the map instead of a scan over every key.
pub(crate) struct ScoreTable {
    slots: HashMap<ContentKey, Slot>,
    order: BTreeMap<(u64, u64), ContentKey>, // (score, seq)
    capacity: NonZeroUsize,
    initial: u64,
    step: u64,
    next_seq: u64,
}

impl ScoreTable {
    pub(crate) fn new(capacity: NonZeroUsize, initial: u64, step: u64) -> Self {
        Self {
            slots: HashMap::with_capacity(capacity.get()),
            order: BTreeMap::new(),
            capacity,
            initial,
            step,
            next_seq: 0,
        }
    }

    pub(crate) fn score(&self, key: &ContentKey) -> Option<u64> {
        self.slots.get(key).map(|slot| slot.score)
    }

    fn bump(&mut self, key: &ContentKey) -> bool {
        let Some(slot) = self.slots.get_mut(key) else {
            return false;
        };
        if let Some(k) = self.order.remove(&(slot.score, slot.seq)) {
            slot.score = slot.score.saturating_add(self.step);
            self.order.insert((slot.score, slot.seq), k);
        }
        true
    }

    pub(crate) fn victim(&self) -> Option<ContentKey> {
        if self.slots.len() < self.capacity.get() {
            return None;
        }
        self.order.first_key_value().map(|(_, k)| k.clone())
    }

    fn evict(&mut self) -> Option<ContentKey> {
        let (_, victim) = self.order.pop_first()?;
        self.slots.remove(&victim);
        Some(victim)
    }
}

impl ScoreTable {
    pub(crate) fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn contains(&self, key: &ContentKey) -> bool {
        self.slots.contains_key(key)
    }

    pub(crate) fn access(&mut self, key: &ContentKey) -> bool {
        self.bump(key)
    }

    pub(crate) fn insert(&mut self, key: ContentKey) -> Option<ContentKey> {
        if self.bump(&key) {
            return None;
        }
        let victim = if self.slots.len() >= self.capacity.get() {
            self.evict()
        } else {
            None
        };
        let slot = Slot {
            score: self.initial,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.order.insert((slot.score, slot.seq), key.clone());
        self.slots.insert(key, slot);
        victim
    }

    pub(crate) fn remove(&mut self, key: &ContentKey) -> bool {
        match self.slots.remove(key) {
            Some(slot) => {
                self.order.remove(&(slot.score, slot.seq));
                true
            }
            None => false,
        }
    }

    pub(crate) fn keys(&self) -> Vec<ContentKey> {
        self.order.values().rev().cloned().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
    }
}

/// Frequency policy: counters start at 1 and grow by 1 per hit.
pub struct LfuPolicy {
    table: ScoreTable,
}

impl LfuPolicy {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            table: ScoreTable::new(capacity, 1, 1),
        }
    }

    pub fn score(&self, key: &ContentKey) -> Option<u64> {
        self.table.score(key)
    }
}

impl CachePolicy for LfuPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Lfu
    }

    fn capacity(&self) -> usize {
        self.table.capacity()
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn contains(&self, key: &ContentKey) -> bool {
        self.table.contains(key)
    }

    fn access(&mut self, key: &ContentKey) -> bool {
        self.table.access(key)
    }

    fn victim(&self) -> Option<ContentKey> {
        self.table.victim()
    }

    fn insert(&mut self, key: ContentKey) -> Option<ContentKey> {
        self.table.insert(key)
    }

    fn remove(&mut self, key: &ContentKey) -> bool {
        self.table.remove(key)
    }

    fn keys(&self) -> Vec<ContentKey> {
        self.table.keys()
    }

    fn clear(&mut self) {
        self.table.clear()
    }
}

use std::num::NonZeroUsize;

use crate::{
    key::ContentKey,
    policy::{lfu::ScoreTable, CachePolicy, PolicyKind},
};

/// Weighted-frequency ("GREEN") policy.
///
/// Scores start at 2 and grow by 2 per hit, which orders keys exactly like
/// [`LfuPolicy`](super::LfuPolicy). The node region is kept for reporting
/// only; it is not part of the score.
pub struct GreenPolicy {
    table: ScoreTable,
    region: Option<String>,
}

impl GreenPolicy {
    pub const INITIAL_SCORE: u64 = 2;
    pub const SCORE_STEP: u64 = 2;

    pub fn new(capacity: NonZeroUsize, region: Option<String>) -> Self {
        Self {
            table: ScoreTable::new(capacity, Self::INITIAL_SCORE, Self::SCORE_STEP),
            region,
        }
    }

    pub fn score(&self, key: &ContentKey) -> Option<u64> {
        self.table.score(key)
    }
}

impl CachePolicy for GreenPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Green
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

    fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

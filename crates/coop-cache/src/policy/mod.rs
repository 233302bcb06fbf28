mod green;
mod lfu;
mod lru;

pub use self::green::GreenPolicy;
pub use self::lfu::LfuPolicy;
pub use self::lru::LruPolicy;

use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::PolicyParseError, key::ContentKey};

/// Eviction decisions over a capacity-bounded set of keys.
///
/// Both operations are total. `insert` of a key that is already tracked is an
/// `access` and never evicts, so the tracked set never exceeds `capacity`.
pub trait CachePolicy: Send + Sync + 'static {
    fn kind(&self) -> PolicyKind;

    fn capacity(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership check, leaves the priority metadata untouched.
    fn contains(&self, key: &ContentKey) -> bool;

    /// Bumps `key` if tracked and reports whether it was.
    fn access(&mut self, key: &ContentKey) -> bool;

    /// The key an `insert` of an untracked key would evict right now, if the
    /// policy is full. Leaves the priority metadata untouched.
    fn victim(&self) -> Option<ContentKey>;

    /// Tracks `key`, returning the victim evicted to make room for it.
    fn insert(&mut self, key: ContentKey) -> Option<ContentKey>;

    /// Drops `key` without selecting a victim. Only used to roll back an
    /// admission whose payload never made it to storage.
    fn remove(&mut self, key: &ContentKey) -> bool;

    /// Tracked keys, next victim last.
    fn keys(&self) -> Vec<ContentKey>;

    fn clear(&mut self);

    /// Region label the policy was built for, if it keeps one.
    fn region(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Least recently used.
    Lru,
    /// Least frequently used.
    Lfu,
    /// Weighted frequency. Same ordering as [`PolicyKind::Lfu`] with scores
    /// scaled by two; the region label does not enter the score.
    Green,
}

impl PolicyKind {
    pub fn build(self, capacity: NonZeroUsize, region: Option<String>) -> Box<dyn CachePolicy> {
        match self {
            PolicyKind::Lru => Box::new(LruPolicy::new(capacity)),
            PolicyKind::Lfu => Box::new(LfuPolicy::new(capacity)),
            PolicyKind::Green => Box::new(GreenPolicy::new(capacity, region)),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" | "recency" => Ok(PolicyKind::Lru),
            "lfu" | "frequency" => Ok(PolicyKind::Lfu),
            "green" | "weighted-frequency" => Ok(PolicyKind::Green),
            _ => Err(PolicyParseError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Lru => "lru",
            PolicyKind::Lfu => "lfu",
            PolicyKind::Green => "green",
        };
        f.write_str(name)
    }
}

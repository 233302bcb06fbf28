use std::num::NonZeroUsize;

use ::lru::LruCache;

use crate::{
    key::ContentKey,
    policy::{CachePolicy, PolicyKind},
};

/// Recency policy: the victim is the key touched longest ago.
pub struct LruPolicy {
    inner: LruCache<ContentKey, ()>,
}

impl LruPolicy {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: LruCache::new(capacity),
        }
    }
}

impl CachePolicy for LruPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Lru
    }

    fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn contains(&self, key: &ContentKey) -> bool {
        self.inner.contains(key)
    }

    fn access(&mut self, key: &ContentKey) -> bool {
        // `get` moves the entry to the head
        self.inner.get(key).is_some()
    }

    fn victim(&self) -> Option<ContentKey> {
        if self.inner.len() < self.inner.cap().get() {
            return None;
        }
        self.inner.peek_lru().map(|(k, _)| k.clone())
    }

    fn insert(&mut self, key: ContentKey) -> Option<ContentKey> {
        if self.access(&key) {
            return None;
        }
        // key is absent, so `push` only returns the evicted tail
        self.inner.push(key, ()).map(|(victim, _)| victim)
    }

    fn remove(&mut self, key: &ContentKey) -> bool {
        self.inner.pop(key).is_some()
    }

    fn keys(&self) -> Vec<ContentKey> {
        self.inner.iter().map(|(k, _)| k.clone()).collect()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}

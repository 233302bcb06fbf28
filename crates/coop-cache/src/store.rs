use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    error::{CacheError, StorageOp},
    key::ContentKey,
    policy::{CachePolicy, PolicyKind},
    storage::ResidentStorage,
};

/// Outcome of [`CacheStore::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The key became resident, possibly at the expense of `evicted`.
    Admitted { evicted: Option<ContentKey> },
    /// The key was already resident; only its priority was bumped.
    Refreshed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub policy: PolicyKind,
    pub capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Next victim last.
    pub resident: Vec<ContentKey>,
}

/// A [`CachePolicy`] bound to the storage holding the payloads it tracks.
///
/// Every policy call and every storage mutation of an admission happen under
/// one lock, so the tracked set and the stored set are equal whenever the lock
/// is free.
pub struct CacheStore<S> {
    policy: Mutex<Box<dyn CachePolicy>>,
    storage: S,
}

impl<S: ResidentStorage> CacheStore<S> {
    pub fn new(policy: Box<dyn CachePolicy>, storage: S) -> Self {
        Self {
            policy: Mutex::new(policy),
            storage,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Local lookup. A hit bumps the key's priority; the payload is read after
    /// the lock is released.
    pub async fn resolve_local(&self, key: &ContentKey) -> Result<Option<Bytes>, CacheError> {
        let hit = self.policy.lock().await.access(key);
        if !hit {
            return Ok(None);
        }
        match self.storage.read(key).await {
            Ok(Some(payload)) => Ok(Some(payload)),
            Ok(None) => {
                // evicted by a concurrent admission after the hit was counted
                debug!("[Cache]: {key} evicted before it could be read");
                Ok(None)
            }
            Err(e) => Err(CacheError::storage(StorageOp::Read, key, e)),
        }
    }

    /// Makes `key` resident with `payload`, evicting the policy's victim first
    /// when the cache is full. The victim's payload is deleted before the
    /// policy is touched, so a delete fault leaves the policy exactly as it
    /// was. A write fault drops the new key again before the error is
    /// returned.
    pub async fn admit(&self, key: ContentKey, payload: Bytes) -> Result<Admission, CacheError> {
        let mut policy = self.policy.lock().await;
        if policy.contains(&key) {
            policy.insert(key);
            return Ok(Admission::Refreshed);
        }

        if let Some(victim) = policy.victim() {
            if let Err(e) = self.storage.remove(&victim).await {
                error!("[Cache]: Failed to delete evicted {victim} while admitting {key}: {e}");
                return Err(CacheError::storage(StorageOp::Delete, &victim, e));
            }
        }
        let evicted = policy.insert(key.clone());
        if let Some(victim) = &evicted {
            debug!("[Cache]: Evicted {victim} to admit {key}");
        }

        if let Err(e) = self.storage.write(&key, payload).await {
            error!("[Cache]: Failed to write {key}: {e}");
            policy.remove(&key);
            if let Err(e) = self.storage.remove(&key).await {
                warn!("[Cache]: Failed to clean up {key} after write fault: {e}");
            }
            return Err(CacheError::storage(StorageOp::Write, &key, e));
        }

        Ok(Admission::Admitted { evicted })
    }

    /// Drops every resident entry, returning how many there were.
    pub async fn purge(&self) -> Result<usize, CacheError> {
        let mut policy = self.policy.lock().await;
        let count = policy.len();
        let keys = policy.keys();
        policy.clear();
        if let Err(e) = self.storage.clear().await {
            error!("[Cache]: Failed to clear storage during purge: {e}");
            // whatever survived on storage stays tracked
            let left = self.storage.keys().await.unwrap_or_default();
            for key in keys.into_iter().rev().filter(|key| left.contains(key)) {
                policy.insert(key);
            }
            return Err(CacheError::Purge(e));
        }
        info!("[Cache]: Purged {count} record(s)");
        Ok(count)
    }

    pub async fn contains(&self, key: &ContentKey) -> bool {
        self.policy.lock().await.contains(key)
    }

    pub async fn len(&self) -> usize {
        self.policy.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn snapshot(&self) -> CacheSnapshot {
        let policy = self.policy.lock().await;
        CacheSnapshot {
            policy: policy.kind(),
            capacity: policy.capacity(),
            region: policy.region().map(str::to_string),
            resident: policy.keys(),
        }
    }
}

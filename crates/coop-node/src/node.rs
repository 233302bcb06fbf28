use std::{fmt, sync::Arc, time::Duration};

use bytes::Bytes;
use coop_cache::{Admission, CacheError, CacheSnapshot, CacheStore, ContentKey, ResidentStorage};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    metrics,
    source::{ContentSource, Lookup, SourceError},
};

/// Where a resolved payload came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServedBy {
    Local,
    Sibling(String),
    Origin,
}

impl fmt::Display for ServedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServedBy::Local => f.write_str("local"),
            ServedBy::Sibling(name) => write!(f, "sibling:{name}"),
            ServedBy::Origin => f.write_str("origin"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub payload: Bytes,
    pub served_by: ServedBy,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("content {0} not found")]
    NotFound(ContentKey),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A cooperative cache node: one local [`CacheStore`], the siblings to ask on
/// a local miss, in order, and the origin to fall back to.
pub struct PeerNode<S> {
    name: String,
    store: CacheStore<S>,
    siblings: Vec<Arc<dyn ContentSource>>,
    origin: Arc<dyn ContentSource>,
    timeout: Duration,
}

impl<S: ResidentStorage> PeerNode<S> {
    pub fn new(
        name: impl Into<String>,
        store: CacheStore<S>,
        siblings: Vec<Arc<dyn ContentSource>>,
        origin: Arc<dyn ContentSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            siblings,
            origin,
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &CacheStore<S> {
        &self.store
    }

    pub fn sibling_names(&self) -> Vec<String> {
        self.siblings.iter().map(|s| s.name().to_string()).collect()
    }

    pub async fn snapshot(&self) -> CacheSnapshot {
        self.store.snapshot().await
    }

    /// Local cache, then each sibling once in order, then the origin once.
    /// The first remote hit is admitted before it is returned.
    #[instrument(skip(self), fields(node = %self.name))]
    pub async fn resolve(&self, key: &ContentKey) -> Result<Resolution, ResolveError> {
        metrics::track_request();
        if let Some(payload) = self.store.resolve_local(key).await? {
            info!("[{}] local hit -> {key}", self.name);
            metrics::track_local_hit();
            return Ok(Resolution {
                payload,
                served_by: ServedBy::Local,
            });
        }

        for sibling in &self.siblings {
            if let Some(payload) = self.lookup(sibling.as_ref(), key).await {
                info!("[{}] remote hit from {} -> {key}", self.name, sibling.name());
                metrics::track_sibling_hit(sibling.name());
                self.admit(key, payload.clone()).await?;
                return Ok(Resolution {
                    payload,
                    served_by: ServedBy::Sibling(sibling.name().to_string()),
                });
            }
        }

        if let Some(payload) = self.lookup(self.origin.as_ref(), key).await {
            info!("[{}] cache miss, fetched from origin -> {key}", self.name);
            metrics::track_origin_hit();
            self.admit(key, payload.clone()).await?;
            return Ok(Resolution {
                payload,
                served_by: ServedBy::Origin,
            });
        }

        info!("[{}] not found anywhere -> {key}", self.name);
        metrics::track_not_found();
        Err(ResolveError::NotFound(key.clone()))
    }

    /// Answers from the local cache only. Used for lookups made by siblings.
    pub async fn resolve_local(&self, key: &ContentKey) -> Result<Option<Bytes>, ResolveError> {
        let payload = self.store.resolve_local(key).await?;
        if payload.is_some() {
            debug!("[{}] local hit for sibling -> {key}", self.name);
            metrics::track_local_hit();
        }
        Ok(payload)
    }

    /// One bounded round trip. Failures count as a miss for this request.
    async fn lookup(&self, source: &dyn ContentSource, key: &ContentKey) -> Option<Bytes> {
        let lookup = timeout(self.timeout, source.fetch(key))
            .await
            .unwrap_or(Lookup::Failed(SourceError::Timeout(self.timeout)));
        match lookup {
            Lookup::Found(payload) => Some(payload),
            Lookup::Absent => {
                debug!("[{}] {} does not have {key}", self.name, source.name());
                None
            }
            Lookup::Failed(e) => {
                warn!("[{}] {} failed for {key}: {e}", self.name, source.name());
                metrics::track_source_failure(source.name());
                None
            }
        }
    }

    async fn admit(&self, key: &ContentKey, payload: Bytes) -> Result<(), ResolveError> {
        match self.store.admit(key.clone(), payload).await {
            Ok(Admission::Admitted { evicted }) => {
                if let Some(victim) = evicted {
                    info!("[{}] evicted {victim} to admit {key}", self.name);
                    metrics::track_eviction();
                }
                Ok(())
            }
            Ok(Admission::Refreshed) => Ok(()),
            Err(e) => {
                error!("[{}] failed to admit {key}: {e}", self.name);
                metrics::track_storage_fault();
                Err(e.into())
            }
        }
    }
}


use std::{
    io,
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use coop_cache::{CacheStore, ContentKey, MemoryStorage, PolicyKind, ResidentStorage};
use simple_logger::SimpleLogger;
use tokio::time::sleep;
use tracing::{log::LevelFilter, warn};

use crate::{
    node::PeerNode,
    source::{ContentSource, Lookup},
};

pub const TIMEOUT: Duration = Duration::from_millis(200);

pub fn setup_logger() {
    let level = LevelFilter::Info;
    if let Err(err) = SimpleLogger::new()
        .with_level(level)
        .with_utc_timestamps()
        .init()
    {
        warn!("Logger already set {:?}:", err)
    }
}

pub fn key(k: &str) -> ContentKey {
    ContentKey::new(k).unwrap()
}

#[derive(Clone)]
pub enum Behavior {
    Found(Bytes),
    Absent,
    Fail,
    Slow(Duration),
}

/// Scripted source that counts how often it was asked.
pub struct MockSource {
    name: String,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new(name: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn serving(name: &str, payload: &'static [u8]) -> Arc<Self> {
        Self::new(name, Behavior::Found(Bytes::from_static(payload)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _key: &ContentKey) -> Lookup {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Found(payload) => Lookup::Found(payload.clone()),
            Behavior::Absent => Lookup::Absent,
            Behavior::Fail => Lookup::Failed(
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused").into(),
            ),
            Behavior::Slow(delay) => {
                sleep(*delay).await;
                Lookup::Found(Bytes::from_static(b"late"))
            }
        }
    }
}

pub fn node(
    name: &str,
    kind: PolicyKind,
    capacity: usize,
    siblings: &[Arc<MockSource>],
    origin: &Arc<MockSource>,
) -> PeerNode<MemoryStorage> {
    let store = CacheStore::new(
        kind.build(NonZeroUsize::new(capacity).unwrap(), None),
        MemoryStorage::new(),
    );
    let siblings = siblings
        .iter()
        .map(|s| Arc::clone(s) as Arc<dyn ContentSource>)
        .collect();
    PeerNode::new(
        name,
        store,
        siblings,
        Arc::clone(origin) as Arc<dyn ContentSource>,
        TIMEOUT,
    )
}

/// Storage whose writes always fail, as on a full or read-only disk.
#[derive(Default)]
pub struct ReadOnlyStorage {
    inner: MemoryStorage,
}

#[async_trait]
impl ResidentStorage for ReadOnlyStorage {
    async fn read(&self, key: &ContentKey) -> io::Result<Option<Bytes>> {
        self.inner.read(key).await
    }

    async fn write(&self, _key: &ContentKey, _payload: Bytes) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "read-only file system"))
    }

    async fn remove(&self, key: &ContentKey) -> io::Result<()> {
        self.inner.remove(key).await
    }

    async fn clear(&self) -> io::Result<()> {
        self.inner.clear().await
    }

    async fn keys(&self) -> io::Result<Vec<ContentKey>> {
        self.inner.keys().await
    }
}

pub fn read_only_node(origin: &Arc<MockSource>) -> PeerNode<ReadOnlyStorage> {
    let store = CacheStore::new(
        PolicyKind::Lru.build(NonZeroUsize::new(2).unwrap(), None),
        ReadOnlyStorage::default(),
    );
    PeerNode::new(
        "peer1",
        store,
        Vec::new(),
        Arc::clone(origin) as Arc<dyn ContentSource>,
        TIMEOUT,
    )
}

mod store_tests;

use std::{
    io,
    num::NonZeroUsize,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use bytes::Bytes;
use simple_logger::SimpleLogger;
use tracing::{log::LevelFilter, warn};

use crate::{key::ContentKey, storage::MemoryStorage, ResidentStorage};

pub fn setup_logger() {
    let level = LevelFilter::Debug;
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

pub fn cap(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

/// Memory storage whose writes and deletes can be made to fail on demand.
#[derive(Default)]
pub struct FaultyStorage {
    pub inner: MemoryStorage,
    pub fail_writes: AtomicBool,
    pub fail_removes: AtomicBool,
}

impl FaultyStorage {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }
}

fn injected() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "injected fault")
}

#[async_trait]
impl ResidentStorage for FaultyStorage {
    async fn read(&self, key: &ContentKey) -> io::Result<Option<Bytes>> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &ContentKey, payload: Bytes) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.write(key, payload).await
    }

    async fn remove(&self, key: &ContentKey) -> io::Result<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.remove(key).await
    }

    async fn clear(&self) -> io::Result<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.clear().await
    }

    async fn keys(&self) -> io::Result<Vec<ContentKey>> {
        self.inner.keys().await
    }
}

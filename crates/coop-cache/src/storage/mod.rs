mod disk;
mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use std::io;

use async_trait::async_trait;
use bytes::Bytes;

use crate::key::ContentKey;

/// Where resident payloads live.
///
/// Implementations only move bytes; which keys are resident is decided by the
/// [`CacheStore`](crate::CacheStore) that owns them.
#[async_trait]
pub trait ResidentStorage: Send + Sync + 'static {
    /// `Ok(None)` when nothing is stored under `key`.
    async fn read(&self, key: &ContentKey) -> io::Result<Option<Bytes>>;

    async fn write(&self, key: &ContentKey, payload: Bytes) -> io::Result<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &ContentKey) -> io::Result<()>;

    async fn clear(&self) -> io::Result<()>;

    async fn keys(&self) -> io::Result<Vec<ContentKey>>;
}

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{key::ContentKey, storage::ResidentStorage};

/// Resident payloads as plain files in a node-local directory, one file per
/// key.
///
/// Writes land in a dot-prefixed temporary file first and are renamed into
/// place, so a reader never sees a partial payload. Content keys can not start
/// with a dot, which keeps the two namespaces apart.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Opens `root`, creating it if needed. Anything left there by a previous
    /// run is deleted: cache state is not carried across restarts.
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        let storage = Self { root };
        let removed = storage.wipe().await?;
        if removed > 0 {
            info!(
                "[DiskStorage]: Removed {removed} stale file(s) from {:?}",
                storage.root
            );
        }
        Ok(storage)
    }

    fn path(&self, key: &ContentKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    fn partial_path(&self, key: &ContentKey) -> PathBuf {
        self.root.join(format!(".{key}.partial"))
    }

    async fn wipe(&self) -> io::Result<usize> {
        let mut count = 0;
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                fs::remove_dir_all(&path).await?;
            } else {
                fs::remove_file(&path).await?;
            }
            count += 1;
        }
        Ok(count)
    }
}

async fn remove_partial(partial: &Path) {
    if let Err(e) = fs::remove_file(partial).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("[DiskStorage]: Failed to remove partial file {partial:?}: {e}");
        }
    }
}

#[async_trait]
impl ResidentStorage for DiskStorage {
    async fn read(&self, key: &ContentKey) -> io::Result<Option<Bytes>> {
        match fs::read(self.path(key)).await {
            Ok(payload) => Ok(Some(Bytes::from(payload))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, key: &ContentKey, payload: Bytes) -> io::Result<()> {
        let partial = self.partial_path(key);
        if let Err(e) = fs::write(&partial, &payload).await {
            remove_partial(&partial).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&partial, self.path(key)).await {
            remove_partial(&partial).await;
            return Err(e);
        }
        debug!("[DiskStorage]: Wrote {} byte(s) for {key}", payload.len());
        Ok(())
    }

    async fn remove(&self, key: &ContentKey) -> io::Result<()> {
        match fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn clear(&self) -> io::Result<()> {
        self.wipe().await.map(|_| ())
    }

    async fn keys(&self) -> io::Result<Vec<ContentKey>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            // partial writes and foreign files are not resident payloads
            if let Some(key) = name.to_str().and_then(|name| ContentKey::new(name).ok()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

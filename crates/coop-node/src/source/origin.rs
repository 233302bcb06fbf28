use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use coop_cache::ContentKey;
use tokio::fs;

use crate::source::{ContentSource, Lookup};

/// Origin content served straight from a directory, one file per key.
pub struct DirOrigin {
    root: PathBuf,
}

impl DirOrigin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentSource for DirOrigin {
    fn name(&self) -> &str {
        "origin"
    }

    async fn fetch(&self, key: &ContentKey) -> Lookup {
        match fs::read(self.root.join(key.as_str())).await {
            Ok(payload) => Lookup::Found(Bytes::from(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Lookup::Absent,
            Err(e) => Lookup::Failed(e.into()),
        }
    }
}

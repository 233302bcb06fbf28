use std::{collections::HashMap, io};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{key::ContentKey, storage::ResidentStorage};

#[derive(Default)]
pub struct MemoryStorage {
    payloads: RwLock<HashMap<ContentKey, Bytes>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResidentStorage for MemoryStorage {
    async fn read(&self, key: &ContentKey) -> io::Result<Option<Bytes>> {
        Ok(self.payloads.read().await.get(key).cloned())
    }

    async fn write(&self, key: &ContentKey, payload: Bytes) -> io::Result<()> {
        self.payloads.write().await.insert(key.clone(), payload);
        Ok(())
    }

    async fn remove(&self, key: &ContentKey) -> io::Result<()> {
        self.payloads.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> io::Result<()> {
        self.payloads.write().await.clear();
        Ok(())
    }

    async fn keys(&self) -> io::Result<Vec<ContentKey>> {
        Ok(self.payloads.read().await.keys().cloned().collect())
    }
}

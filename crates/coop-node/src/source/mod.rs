mod http;
mod origin;

pub use http::{HttpClient, HttpSource, Scope};
pub use origin::DirOrigin;

use std::{io, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use coop_cache::ContentKey;
use hyper::StatusCode;
use thiserror::Error;

/// Outcome of asking one remote source for a key.
#[derive(Debug)]
pub enum Lookup {
    Found(Bytes),
    Absent,
    Failed(SourceError),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("invalid uri {0}")]
    InvalidUri(String),
    #[error(transparent)]
    Transport(#[from] hyper::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A sibling node or the origin, as seen by the resolution pipeline.
#[async_trait]
pub trait ContentSource: Send + Sync + 'static {
    /// Name used in logs, metrics and the `x-served-by` header.
    fn name(&self) -> &str;

    async fn fetch(&self, key: &ContentKey) -> Lookup;
}

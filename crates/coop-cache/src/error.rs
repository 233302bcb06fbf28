use std::{fmt, io};

use thiserror::Error;

use crate::key::ContentKey;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("content key is empty")]
    Empty,
    #[error("content key is longer than {max} bytes")]
    TooLong { max: usize },
    #[error("content key must not start with '.'")]
    Hidden,
    #[error("content key contains invalid character {0:?}")]
    InvalidChar(char),
}

#[derive(Debug, Error)]
pub enum PolicyParseError {
    #[error("unknown cache policy {0:?}, expected one of lru, lfu, green")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Read,
    Write,
    Delete,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            StorageOp::Read => "read",
            StorageOp::Write => "write",
            StorageOp::Delete => "delete",
        };
        f.write_str(op)
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    /// A resident payload could not be read, written or deleted. Admission
    /// faults are rolled back before this is returned.
    #[error("[Cache]: storage fault on {op} of {key}: {source}")]
    Storage {
        op: StorageOp,
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("[Cache]: storage fault while purging: {0}")]
    Purge(#[source] io::Error),
}

impl CacheError {
    pub(crate) fn storage(op: StorageOp, key: &ContentKey, source: io::Error) -> Self {
        CacheError::Storage {
            op,
            key: key.to_string(),
            source,
        }
    }
}

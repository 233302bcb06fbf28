//! Local cache of a coop node: eviction policies over a capacity-bounded key
//! set, the storage that holds resident payloads, and the [`CacheStore`] that
//! keeps the two in sync.

pub mod error;
pub mod key;
pub mod policy;
pub mod storage;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{CacheError, KeyError, PolicyParseError, StorageOp};
pub use key::ContentKey;
pub use policy::{CachePolicy, GreenPolicy, LfuPolicy, LruPolicy, PolicyKind};
pub use storage::{DiskStorage, MemoryStorage, ResidentStorage};
pub use store::{Admission, CacheSnapshot, CacheStore};

use std::{collections::HashSet, sync::Arc};

use bytes::Bytes;

use crate::{
    error::{CacheError, StorageOp},
    policy::PolicyKind,
    storage::{DiskStorage, MemoryStorage, ResidentStorage},
    store::{Admission, CacheStore},
    tests::{cap, key, setup_logger, FaultyStorage},
    ContentKey,
};

fn memory_store(kind: PolicyKind, capacity: usize) -> CacheStore<MemoryStorage> {
    CacheStore::new(kind.build(cap(capacity), None), MemoryStorage::new())
}

async fn assert_in_sync<S: ResidentStorage>(store: &CacheStore<S>) {
    let tracked: HashSet<ContentKey> = store.snapshot().await.resident.into_iter().collect();
    let stored: HashSet<ContentKey> = store.storage().keys().await.unwrap().into_iter().collect();
    assert_eq!(tracked, stored);
}

#[tokio::test]
async fn test_miss_leaves_store_untouched() {
    let store = memory_store(PolicyKind::Lfu, 2);
    assert_eq!(store.resolve_local(&key("a")).await.unwrap(), None);
    assert!(store.is_empty().await);
    assert!(store.storage().keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admit_then_hit() {
    let store = memory_store(PolicyKind::Lru, 2);
    let admission = store
        .admit(key("a"), Bytes::from_static(b"alpha"))
        .await
        .unwrap();
    assert_eq!(admission, Admission::Admitted { evicted: None });
    assert_eq!(
        store.resolve_local(&key("a")).await.unwrap(),
        Some(Bytes::from_static(b"alpha"))
    );
    assert_in_sync(&store).await;
}

#[tokio::test]
async fn test_eviction_deletes_victim_payload() {
    let store = memory_store(PolicyKind::Lru, 2);
    store.admit(key("A"), Bytes::from_static(b"a")).await.unwrap();
    store.admit(key("B"), Bytes::from_static(b"b")).await.unwrap();
    store.resolve_local(&key("A")).await.unwrap();
    let admission = store.admit(key("C"), Bytes::from_static(b"c")).await.unwrap();
    assert_eq!(
        admission,
        Admission::Admitted {
            evicted: Some(key("B"))
        }
    );
    assert_eq!(store.storage().read(&key("B")).await.unwrap(), None);
    assert_eq!(store.resolve_local(&key("B")).await.unwrap(), None);
    assert_in_sync(&store).await;
}

#[tokio::test]
async fn test_redundant_admission_only_bumps() {
    let store = memory_store(PolicyKind::Lfu, 2);
    store.admit(key("A"), Bytes::from_static(b"a")).await.unwrap();
    store.admit(key("B"), Bytes::from_static(b"b")).await.unwrap();
    let admission = store
        .admit(key("A"), Bytes::from_static(b"other"))
        .await
        .unwrap();
    assert_eq!(admission, Admission::Refreshed);
    assert_eq!(store.len().await, 2);
    // payload is not rewritten
    assert_eq!(
        store.storage().read(&key("A")).await.unwrap(),
        Some(Bytes::from_static(b"a"))
    );
    // A's counter is now 2, so B goes first
    let admission = store.admit(key("C"), Bytes::from_static(b"c")).await.unwrap();
    assert_eq!(
        admission,
        Admission::Admitted {
            evicted: Some(key("B"))
        }
    );
}

#[tokio::test]
async fn test_write_fault_rolls_back() {
    setup_logger();
    let store = CacheStore::new(PolicyKind::Lru.build(cap(2), None), FaultyStorage::default());
    store.admit(key("A"), Bytes::from_static(b"a")).await.unwrap();
    store.storage().fail_writes(true);
    let err = store
        .admit(key("B"), Bytes::from_static(b"b"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CacheError::Storage {
            op: StorageOp::Write,
            ..
        }
    ));
    assert!(!store.contains(&key("B")).await);
    assert!(store.contains(&key("A")).await);
    assert_in_sync(&store).await;

    store.storage().fail_writes(false);
    store.admit(key("B"), Bytes::from_static(b"b")).await.unwrap();
    assert_in_sync(&store).await;
}

#[tokio::test]
async fn test_write_fault_after_eviction_keeps_sync() {
    let store = CacheStore::new(PolicyKind::Lfu.build(cap(1), None), FaultyStorage::default());
    store.admit(key("A"), Bytes::from_static(b"a")).await.unwrap();
    store.storage().fail_writes(true);
    assert!(store.admit(key("B"), Bytes::from_static(b"b")).await.is_err());
    // A was evicted before the write failed: gone on both sides
    assert!(store.is_empty().await);
    assert_in_sync(&store).await;
}

#[tokio::test]
async fn test_delete_fault_restores_victim() {
    let store = CacheStore::new(PolicyKind::Lru.build(cap(1), None), FaultyStorage::default());
    store.admit(key("A"), Bytes::from_static(b"a")).await.unwrap();
    store.storage().fail_removes(true);
    let err = store
        .admit(key("B"), Bytes::from_static(b"b"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CacheError::Storage {
            op: StorageOp::Delete,
            ..
        }
    ));
    assert!(store.contains(&key("A")).await);
    assert!(!store.contains(&key("B")).await);
    assert_eq!(
        store.resolve_local(&key("A")).await.unwrap(),
        Some(Bytes::from_static(b"a"))
    );
    assert_in_sync(&store).await;
}

#[tokio::test]
async fn test_delete_fault_keeps_eviction_order() {
    setup_logger();
    for kind in [PolicyKind::Lru, PolicyKind::Lfu, PolicyKind::Green] {
        let store = CacheStore::new(kind.build(cap(2), None), FaultyStorage::default());
        store.admit(key("A"), Bytes::from_static(b"a")).await.unwrap();
        store.admit(key("B"), Bytes::from_static(b"b")).await.unwrap();
        let before = store.snapshot().await.resident;

        store.storage().fail_removes(true);
        assert!(store.admit(key("C"), Bytes::from_static(b"c")).await.is_err());
        assert_eq!(store.snapshot().await.resident, before, "{kind}");
        assert_in_sync(&store).await;

        store.storage().fail_removes(false);
        let admission = store.admit(key("D"), Bytes::from_static(b"d")).await.unwrap();
        assert_eq!(
            admission,
            Admission::Admitted {
                evicted: Some(key("A"))
            },
            "{kind}"
        );
        assert_in_sync(&store).await;
    }
}

#[tokio::test]
async fn test_snapshot_reports_region() {
    let store = CacheStore::new(
        PolicyKind::Green.build(cap(2), Some("Caruaru".into())),
        MemoryStorage::new(),
    );
    assert_eq!(store.snapshot().await.region.as_deref(), Some("Caruaru"));
    assert_eq!(memory_store(PolicyKind::Lru, 2).snapshot().await.region, None);
}

#[tokio::test]
async fn test_purge() {
    let store = memory_store(PolicyKind::Green, 3);
    for k in ["a", "b", "c"] {
        store.admit(key(k), Bytes::from_static(b"x")).await.unwrap();
    }
    assert_eq!(store.purge().await.unwrap(), 3);
    assert!(store.is_empty().await);
    assert_in_sync(&store).await;
}

#[tokio::test]
async fn test_concurrent_admissions_respect_capacity() {
    let store = Arc::new(memory_store(PolicyKind::Lfu, 3));
    let mut handles = Vec::new();
    for i in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let k = key(&format!("k{}", i % 8));
            if store.resolve_local(&k).await.unwrap().is_none() {
                store.admit(k, Bytes::from(vec![i as u8])).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert!(store.len().await <= 3);
    assert_in_sync(&store).await;
}

#[tokio::test]
async fn test_disk_storage_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("stale.txt"), b"left over")?;

    let storage = DiskStorage::open(dir.path()).await?;
    assert!(storage.keys().await?.is_empty());

    storage.write(&key("video1.txt"), Bytes::from_static(b"v1")).await?;
    assert_eq!(
        storage.read(&key("video1.txt")).await?,
        Some(Bytes::from_static(b"v1"))
    );
    assert_eq!(storage.keys().await?, vec![key("video1.txt")]);

    storage.remove(&key("video1.txt")).await?;
    storage.remove(&key("video1.txt")).await?;
    assert_eq!(storage.read(&key("video1.txt")).await?, None);
    Ok(())
}

#[tokio::test]
async fn test_disk_storage_failed_rename_leaves_no_partial() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let storage = DiskStorage::open(dir.path()).await?;
    // a non-empty directory in the way makes the final rename fail
    std::fs::create_dir(dir.path().join("video1.txt"))?;
    std::fs::write(dir.path().join("video1.txt").join("inner"), b"x")?;

    assert!(storage
        .write(&key("video1.txt"), Bytes::from_static(b"v1"))
        .await
        .is_err());
    assert!(!dir.path().join(".video1.txt.partial").exists());
    Ok(())
}

#[tokio::test]
async fn test_disk_store_evicts_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = CacheStore::new(
        PolicyKind::Lru.build(cap(2), None),
        DiskStorage::open(dir.path()).await?,
    );
    for k in ["video1.txt", "video2.txt", "video3.txt"] {
        store.admit(key(k), Bytes::from(k.as_bytes().to_vec())).await?;
    }
    assert!(!dir.path().join("video1.txt").exists());
    assert!(dir.path().join("video2.txt").exists());
    assert!(dir.path().join("video3.txt").exists());
    assert_in_sync(&store).await;

    assert_eq!(store.purge().await?, 2);
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

use crate::{Result, SnapshotStore, StoreError, StoreKey};
use async_trait::async_trait;
use fasthar_core::Snapshot;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Process-local store. Snapshots are kept serialized, as a remote list
/// store would keep them, and are gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: RwLock<HashMap<String, Vec<String>>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn append(&self, key: &StoreKey, snapshot: &Snapshot) -> Result<()> {
        self.ensure_open()?;
        let line = serde_json::to_string(snapshot)?;

        let mut lists = self.lists.write().await;
        let list = lists.entry(key.as_str().to_string()).or_default();
        list.push(line);

        tracing::debug!("Appended snapshot #{} for {}", list.len(), key);
        Ok(())
    }

    async fn list(&self, key: &StoreKey) -> Result<Vec<Snapshot>> {
        self.ensure_open()?;
        let lists = self.lists.read().await;
        let Some(list) = lists.get(key.as_str()) else {
            return Ok(vec![]);
        };

        list.iter()
            .enumerate()
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|source| StoreError::Corrupt {
                    key: key.to_string(),
                    line: idx + 1,
                    source,
                })
            })
            .collect()
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.lists.write().await.clear();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fasthar_core::har::HarReader;

    fn snapshot(snapshot_ref: &str) -> Snapshot {
        Snapshot::new(
            HarReader::from_str(&format!(
                r#"{{"log":{{"version":"1.2","_ref":"{snapshot_ref}","entries":[]}}}}"#
            ))
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_list_returns_append_order() {
        let store = MemoryStore::new();
        let key = StoreKey::for_url("http://example.com");

        for r in ["r1", "r2", "r3"] {
            store.append(&key, &snapshot(r)).await.unwrap();
        }

        let refs: Vec<String> = store
            .list(&key)
            .await
            .unwrap()
            .iter()
            .map(|s| s.snapshot_ref().unwrap().to_string())
            .collect();
        assert_eq!(refs, vec!["r1", "r2", "r3"]);
    }

    #[tokio::test]
    async fn test_unknown_key_is_empty() {
        let store = MemoryStore::new();

        let history = store.list(&StoreKey::for_url("http://nowhere")).await.unwrap();

        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let store = MemoryStore::new();
        let a = StoreKey::for_url("http://a.example");
        let b = StoreKey::for_url("http://b.example");

        store.append(&a, &snapshot("a1")).await.unwrap();

        assert_eq!(store.list(&a).await.unwrap().len(), 1);
        assert!(store.list(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_store_rejects_calls() {
        let store = MemoryStore::new();
        let key = StoreKey::for_url("http://example.com");

        store.close().await.unwrap();

        assert!(matches!(store.append(&key, &snapshot("r1")).await, Err(StoreError::Closed)));
        assert!(matches!(store.list(&key).await, Err(StoreError::Closed)));
    }
}

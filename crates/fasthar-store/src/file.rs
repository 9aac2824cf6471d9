use crate::{Result, SnapshotStore, StoreError, StoreKey};
use async_trait::async_trait;
use fasthar_core::Snapshot;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Longest file stem that still fits a file name on common filesystems
const MAX_KEY_LEN: usize = 240;

/// Separator before the digest of an overlong key. Percent-encoding always
/// escapes `+`, so no plain key contains it.
const DIGEST_SEPARATOR: char = '+';

/// On-disk store: one JSON-lines file per key, one snapshot per line.
///
/// Appends hold the lock exclusively so lines from concurrent captures never
/// interleave and readers never see a line mid-write. A trailing segment
/// without its newline (another process still appending) is skipped.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    lock: RwLock<()>,
    closed: AtomicBool,
}

impl FileStore {
    /// Open the store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        tracing::info!("Opened snapshot store at {}", root.display());

        Ok(Self {
            root,
            lock: RwLock::new(()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &StoreKey) -> PathBuf {
        self.root.join(format!("{}.jsonl", file_stem(key)))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

/// File stem for `key`: the key itself, or for overlong keys a prefix of it
/// followed by the SHA-256 of the whole key
fn file_stem(key: &StoreKey) -> String {
    let name = key.as_str();
    if name.len() <= MAX_KEY_LEN {
        return name.to_string();
    }

    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    // Keys are percent-encoded ASCII, so any byte index is a char boundary
    let prefix = &name[..MAX_KEY_LEN - digest.len() - 1];
    format!("{}{}{}", prefix, DIGEST_SEPARATOR, digest)
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn append(&self, key: &StoreKey, snapshot: &Snapshot) -> Result<()> {
        self.ensure_open()?;
        let path = self.path_for(key);

        let mut line = serde_json::to_string(snapshot)?;
        line.push('\n');

        let _guard = self.lock.write().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Appended {} bytes to {}", line.len(), path.display());
        Ok(())
    }

    async fn list(&self, key: &StoreKey) -> Result<Vec<Snapshot>> {
        self.ensure_open()?;
        let path = self.path_for(key);

        let content = {
            let _guard = self.lock.read().await;
            match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
                Err(e) => return Err(e.into()),
            }
        };

        content
            .split_inclusive('\n')
            .enumerate()
            .filter(|(idx, line)| {
                let complete = line.ends_with('\n');
                if !complete {
                    tracing::debug!("Skipping unfinished line {} of {}", idx + 1, key);
                }
                complete && !line.trim().is_empty()
            })
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
        // Wait out an in-flight append before refusing new ones
        let _guard = self.lock.write().await;
        self.closed.store(true, Ordering::Release);
        tracing::info!("Closed snapshot store at {}", self.root.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
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
    async fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let key = StoreKey::for_url("http://example.com");

        let store = FileStore::open(dir.path()).await.unwrap();
        store.append(&key, &snapshot("r1")).await.unwrap();
        store.append(&key, &snapshot("r2")).await.unwrap();
        store.close().await.unwrap();

        let reopened = FileStore::open(dir.path()).await.unwrap();
        let history = reopened.list(&key).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].snapshot_ref(), Some("r1"));
        assert_eq!(history[1].snapshot_ref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_stored_line_wraps_har() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let key = StoreKey::for_url("http://example.com");

        store.append(&key, &snapshot("r1")).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join(format!("{}.jsonl", key))).unwrap();
        assert!(raw.starts_with(r#"{"har":{"log":"#));
        assert!(raw.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_corrupt_line_fails_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let key = StoreKey::for_url("http://example.com");

        store.append(&key, &snapshot("r1")).await.unwrap();
        let path = dir.path().join(format!("{}.jsonl", key));
        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push_str("{not json\n");
        std::fs::write(&path, raw).unwrap();

        let err = store.list(&key).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }));
    }

    #[tokio::test]
    async fn test_overlong_key_maps_to_hashed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let url = format!("http://example.com/{}?q=1", "a".repeat(300));
        let key = StoreKey::for_url(&url);
        let sibling = StoreKey::for_url(&format!("{}&r=2", url));

        store.append(&key, &snapshot("r1")).await.unwrap();
        store.append(&sibling, &snapshot("r2")).await.unwrap();

        let history = store.list(&key).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].snapshot_ref(), Some("r1"));
        assert_eq!(store.list(&sibling).await.unwrap()[0].snapshot_ref(), Some("r2"));

        let stem = file_stem(&key);
        assert_eq!(stem.len(), MAX_KEY_LEN);
        assert!(stem.contains(DIGEST_SEPARATOR));
        assert!(dir.path().join(format!("{}.jsonl", stem)).is_file());
    }

    #[test]
    fn test_short_key_is_its_own_file_stem() {
        let key = StoreKey::for_url("http://example.com");
        assert_eq!(file_stem(&key), key.as_str());
    }

    #[tokio::test]
    async fn test_unfinished_last_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let key = StoreKey::for_url("http://example.com");

        store.append(&key, &snapshot("r1")).await.unwrap();
        let path = dir.path().join(format!("{}.jsonl", key));
        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push_str(r#"{"har":{"log":{"ver"#);
        std::fs::write(&path, raw).unwrap();

        let history = store.list(&key).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_list_during_large_appends_never_sees_partial_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::open(dir.path()).await.unwrap());
        let key = StoreKey::for_url("http://example.com");

        let mut large = snapshot("big");
        large
            .har
            .log
            .extensions
            .insert("_padding".into(), "x".repeat(4 * 1024 * 1024).into());

        let writer = {
            let store = std::sync::Arc::clone(&store);
            let key = key.clone();
            tokio::spawn(async move {
                for _ in 0..5 {
                    store.append(&key, &large).await.unwrap();
                }
            })
        };

        while !writer.is_finished() {
            let history = store.list(&key).await.unwrap();
            assert!(history.iter().all(|s| s.snapshot_ref() == Some("big")));
        }
        writer.await.unwrap();

        assert_eq!(store.list(&key).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_append_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.close().await.unwrap();

        let result = store
            .append(&StoreKey::for_url("http://example.com"), &snapshot("r1"))
            .await;

        assert!(matches!(result, Err(StoreError::Closed)));
    }
}

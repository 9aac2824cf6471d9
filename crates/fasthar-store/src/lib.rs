//! Append-only history of enriched snapshots.
//!
//! A store keeps, per URL, the ordered sequence of snapshots appended for it.
//! There is no update, delete or compaction, and refs are not required to be
//! unique: looking a snapshot up by ref is a scan over [`SnapshotStore::list`].

mod error;
mod file;
mod key;
mod memory;
mod open;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use key::{StoreKey, page_url};
pub use memory::MemoryStore;
pub use open::{default_store_url, open};

use async_trait::async_trait;
use fasthar_core::Snapshot;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Append a snapshot to the end of the key's history
    async fn append(&self, key: &StoreKey, snapshot: &Snapshot) -> Result<()>;

    /// Every snapshot for the key in append order; empty if the key is unknown
    async fn list(&self, key: &StoreKey) -> Result<Vec<Snapshot>>;

    /// Release the store. Later calls fail with [`StoreError::Closed`].
    async fn close(&self) -> Result<()>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

use crate::{FileStore, MemoryStore, Result, SnapshotStore, StoreError};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// `file://` URL of the per-user store, `~/.fasthar/db`
pub fn default_store_url() -> String {
    let root = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fasthar")
        .join("db");
    match Url::from_directory_path(&root) {
        Ok(url) => url.to_string(),
        Err(()) => format!("file://{}", root.display()),
    }
}

/// Open a store from its connection URL.
///
/// Supported schemes are `memory://` and `file:///absolute/path`. A bare
/// filesystem path is treated as a `file` URL.
pub async fn open(connection: &str) -> Result<Arc<dyn SnapshotStore>> {
    let url = match Url::parse(connection) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Ok(Arc::new(FileStore::open(connection).await?));
        }
        Err(e) => return Err(StoreError::InvalidUrl(format!("{}: {}", connection, e))),
    };

    let store: Arc<dyn SnapshotStore> = match url.scheme() {
        "memory" => Arc::new(MemoryStore::new()),
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| StoreError::InvalidUrl(connection.to_string()))?;
            Arc::new(FileStore::open(path).await?)
        }
        other => {
            return Err(StoreError::InvalidUrl(format!(
                "{} (scheme {} is not supported, use memory:// or file://)",
                connection, other
            )));
        }
    };

    tracing::debug!("Opened store {}", store.describe());
    Ok(store)
}

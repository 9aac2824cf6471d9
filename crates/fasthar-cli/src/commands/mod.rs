pub mod capture;
pub mod chart;
pub mod completion;
pub mod history;
pub mod serve;
pub mod stats;

use anyhow::{Context, Result};
use fasthar_core::Snapshot;
use fasthar_store::StoreKey;

/// Every stored snapshot of `url`, oldest first
pub async fn load_history(store_url: &str, url: &str) -> Result<Vec<Snapshot>> {
    let url = fasthar_store::page_url(url)?;
    let store = fasthar_store::open(store_url)
        .await
        .with_context(|| format!("Failed to open store {}", store_url))?;
    let history = store.list(&StoreKey::for_url(url)).await?;
    store.close().await?;

    tracing::debug!("Loaded {} snapshots of {}", history.len(), url);
    Ok(history)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

pub mod har;
pub mod jobs;
pub mod stats;

use crate::error::ApiError;
use crate::state::AppState;
use axum::Router;
use fasthar_core::Snapshot;
use fasthar_store::{StoreError, StoreKey};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(har::router())
        .merge(stats::router())
        .merge(jobs::router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `url` and optional `ref`, shared by the history, stats and chart reads
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub url: Option<String>,
    #[serde(rename = "ref")]
    pub snapshot_ref: Option<String>,
}

impl HistoryParams {
    pub fn snapshot_ref(&self) -> Option<&str> {
        self.snapshot_ref.as_deref().filter(|r| !r.is_empty())
    }
}

/// The `url` parameter, which must be present and an absolute URL with a host
pub(crate) fn require_url(url: Option<&str>) -> Result<&str, ApiError> {
    fasthar_store::page_url(url.unwrap_or_default())
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Stored history for `url`.
///
/// `None` when the store could not be read, so callers answer with an empty
/// result. A corrupt stored document is an internal error instead.
pub(crate) async fn load_history(
    state: &AppState,
    url: &str,
) -> Result<Option<Vec<Snapshot>>, ApiError> {
    let key = StoreKey::for_url(url);
    match state.store.list(&key).await {
        Ok(history) => Ok(Some(history)),
        Err(e @ StoreError::Corrupt { .. }) => Err(ApiError::Internal(e.to_string())),
        Err(e) => {
            tracing::warn!("Failed to read history for {}: {}", url, e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_url() {
        assert_eq!(
            require_url(Some("http://thephantomoftheopera.com")).unwrap(),
            "http://thephantomoftheopera.com"
        );
        assert_eq!(
            require_url(Some(" http://thephantomoftheopera.com ")).unwrap(),
            "http://thephantomoftheopera.com"
        );
        assert!(matches!(require_url(None), Err(ApiError::BadRequest(_))));
        assert!(matches!(require_url(Some("  ")), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            require_url(Some("thephantomoftheopera.com")),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            require_url(Some("javascript:alert(1)")),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_empty_ref_is_no_ref() {
        let params = HistoryParams {
            url: None,
            snapshot_ref: Some(String::new()),
        };
        assert_eq!(params.snapshot_ref(), None);
    }
}

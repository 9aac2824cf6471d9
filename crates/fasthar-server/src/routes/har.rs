use super::{HistoryParams, load_history, require_url};
use crate::error::ApiError;
use crate::pipeline::CaptureRequest;
use crate::state::AppState;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use fasthar_core::{Snapshot, SnapshotTag};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/har/fetch", get(fetch_get).post(fetch_post))
        .route("/har/history", get(history))
}

#[derive(Debug, Default, Deserialize)]
pub struct FetchParams {
    pub url: Option<String>,
    /// Milliseconds the browser waits after load before recording
    pub delay: Option<String>,
    #[serde(rename = "ref")]
    pub snapshot_ref: Option<String>,
    /// Push webhook body, as JSON text
    pub payload: Option<String>,
}

impl FetchParams {
    /// Fill fields missing here from `fallback`
    fn or(self, fallback: FetchParams) -> Self {
        Self {
            url: self.url.or(fallback.url),
            delay: self.delay.or(fallback.delay),
            snapshot_ref: self.snapshot_ref.or(fallback.snapshot_ref),
            payload: self.payload.or(fallback.payload),
        }
    }

    fn into_request(self) -> Result<CaptureRequest, ApiError> {
        let url = require_url(self.url.as_deref())?.to_string();

        let delay_ms = match self.delay.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                ApiError::BadRequest(format!(
                    "delay must be a whole number of milliseconds: {}",
                    raw
                ))
            })?),
        };

        let tag = SnapshotTag::new(self.snapshot_ref).with_payload(self.payload.as_deref());

        Ok(CaptureRequest { url, delay_ms, tag })
    }
}

async fn fetch_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FetchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    submit(&state, params).await
}

/// Form body fields win over query parameters of the same name
async fn fetch_post(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FetchParams>,
    form: Result<Form<FetchParams>, FormRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let params = match form {
        Ok(Form(body)) => body.or(query),
        Err(e) => {
            tracing::debug!("No form body on capture request: {}", e);
            query
        }
    };
    submit(&state, params).await
}

async fn submit(state: &AppState, params: FetchParams) -> Result<Json<serde_json::Value>, ApiError> {
    let request = params.into_request()?;
    let job = state.jobs.submit(request).await;
    Ok(Json(json!({ "success": true, "job": job })))
}

/// Stored documents for a URL, or the one tagged `ref`
async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Response, ApiError> {
    let url = require_url(params.url.as_deref())?;
    let history = load_history(&state, url).await?;

    let response = match (params.snapshot_ref(), history) {
        (Some(_), None) => Json(json!({})).into_response(),
        (None, None) => Json(json!([])).into_response(),
        (Some(snapshot_ref), Some(history)) => match Snapshot::find(&history, snapshot_ref) {
            Some(snapshot) => Json(&snapshot.har).into_response(),
            None => Json(json!({})).into_response(),
        },
        (None, Some(history)) => {
            let documents: Vec<_> = history.iter().map(|snapshot| &snapshot.har).collect();
            Json(documents).into_response()
        }
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(url: &str) -> FetchParams {
        FetchParams {
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_into_request_defaults_ref_to_timestamp() {
        let request = params("http://example.com").into_request().unwrap();

        assert_eq!(request.url, "http://example.com");
        assert_eq!(request.delay_ms, None);
        assert!(request.tag.snapshot_ref.ends_with('Z'));
        assert_eq!(request.tag.sha, None);
    }

    #[test]
    fn test_into_request_reads_payload() {
        let request = FetchParams {
            snapshot_ref: Some("badc0ffee".to_string()),
            payload: Some(
                r#"{"after":"abc123","repository":{"url":"https://github.com/o/r"}}"#.to_string(),
            ),
            delay: Some("250".to_string()),
            ..params("http://example.com")
        }
        .into_request()
        .unwrap();

        assert_eq!(request.tag.snapshot_ref, "badc0ffee");
        assert_eq!(request.tag.sha.as_deref(), Some("abc123"));
        assert_eq!(request.tag.repo_url.as_deref(), Some("https://github.com/o/r"));
        assert_eq!(request.delay_ms, Some(250));
    }

    #[test]
    fn test_into_request_rejects_bad_delay() {
        let result = FetchParams {
            delay: Some("soon".to_string()),
            ..params("http://example.com")
        }
        .into_request();

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_body_fields_win_over_query() {
        let body = FetchParams {
            snapshot_ref: Some("from-body".to_string()),
            ..Default::default()
        };
        let query = FetchParams {
            snapshot_ref: Some("from-query".to_string()),
            ..params("http://example.com")
        };

        let merged = body.or(query);

        assert_eq!(merged.snapshot_ref.as_deref(), Some("from-body"));
        assert_eq!(merged.url.as_deref(), Some("http://example.com"));
    }
}

use crate::error::ApiError;
use crate::jobs::CaptureJob;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/cancel", post(cancel_job))
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound(format!("Job not found: {}", id)))
}

async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<CaptureJob>> {
    Json(state.jobs.list().await)
}

async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CaptureJob>, ApiError> {
    state
        .jobs
        .get(parse_id(&id)?)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", id)))
}

async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CaptureJob>, ApiError> {
    state
        .jobs
        .cancel(parse_id(&id)?)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", id)))
}

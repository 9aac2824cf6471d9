use super::{HistoryParams, load_history, require_url};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use fasthar_core::StatKey;
use fasthar_core::analysis::{ChartProjector, ChartSeries, StatKind, Stats, StatsAggregator};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats/history", get(stats_history))
        .route("/charts/{stat}", get(chart))
}

/// Per-snapshot stats for a URL, or the stats of the snapshot tagged `ref`
async fn stats_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Response, ApiError> {
    let url = require_url(params.url.as_deref())?;
    let Some(history) = load_history(&state, url).await? else {
        return Ok(match params.snapshot_ref() {
            Some(_) => Json(json!({})).into_response(),
            None => Json(json!([])).into_response(),
        });
    };

    let stats: Vec<Stats> = history
        .iter()
        .map(|snapshot| StatsAggregator::compute(&snapshot.har))
        .collect();

    let response = match params.snapshot_ref() {
        Some(snapshot_ref) => match stats
            .into_iter()
            .find(|s| s.snapshot_ref.as_deref() == Some(snapshot_ref))
        {
            Some(single) => Json(single).into_response(),
            None => Json(json!({})).into_response(),
        },
        None => Json(stats).into_response(),
    };

    Ok(response)
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartParams {
    pub url: Option<String>,
    #[serde(rename = "ref")]
    pub snapshot_ref: Option<String>,
    pub resource: Option<String>,
    pub exclude: Option<String>,
}

fn parse_stat_key(raw: Option<&str>) -> Result<Option<StatKey>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name
            .parse()
            .map(Some)
            .map_err(|e: fasthar_core::Error| ApiError::BadRequest(e.to_string())),
    }
}

/// Chart series of one statistic across a URL's history.
///
/// With `ref`, the chart covers only the snapshot tagged with it.
async fn chart(
    State(state): State<Arc<AppState>>,
    Path(stat): Path<String>,
    Query(params): Query<ChartParams>,
) -> Result<Json<ChartSeries>, ApiError> {
    let kind: StatKind = stat
        .parse()
        .map_err(|e: fasthar_core::Error| ApiError::BadRequest(e.to_string()))?;
    let url = require_url(params.url.as_deref())?;
    let filter = parse_stat_key(params.resource.as_deref())?;
    let exclude = parse_stat_key(params.exclude.as_deref())?;
    let snapshot_ref = params.snapshot_ref.as_deref().filter(|r| !r.is_empty());

    let history = load_history(&state, url).await?.unwrap_or_default();
    let stats: Vec<Stats> = history
        .iter()
        .filter(|snapshot| snapshot_ref.is_none() || snapshot.snapshot_ref() == snapshot_ref)
        .map(|snapshot| StatsAggregator::compute(&snapshot.har))
        .collect();

    Ok(Json(ChartProjector::project(&stats, kind, filter, exclude)))
}

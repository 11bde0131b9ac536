//! Trigger handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use super::error::ApiError;
use crate::feed::Entry;
use crate::monitor::{CycleReport, Policy, PollCycle};
use crate::store::SeenRecord;

/// Number of records returned by `/stats`.
pub const STATS_RECENT: usize = 10;

/// Shared application state.
pub struct AppState {
    /// The poll cycle every trigger runs against.
    pub cycle: Arc<PollCycle>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(cycle: Arc<PollCycle>) -> Self {
        Self { cycle }
    }
}

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// `/test` response.
#[derive(Debug, Serialize)]
pub struct TestResponse {
    /// Whether the webhook accepted the notification.
    pub delivered: bool,
    /// The entry that was sent.
    pub entry: Entry,
}

/// `/clear` response.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// `/stats` response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Number of stored records.
    pub total: usize,
    /// Most recently stored record.
    pub latest: Option<SeenRecord>,
    /// Up to [`STATS_RECENT`] most recent records, oldest first.
    pub items: Vec<SeenRecord>,
}

const HELP_TEXT: &str = "rss-notify trigger endpoints:
  /test   send the newest feed entry once (store untouched)
  /check  run one check and notify new entries
  /init   record all current entries without notifying
  /clear  empty the seen-item store
  /stats  show stored record count and recent records
  /health liveness check
";

/// Root: help text.
pub async fn help() -> &'static str {
    HELP_TEXT
}

/// Deliver the newest entry once.
pub async fn send_test(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<TestResponse>>, ApiError> {
    let delivery = state
        .cycle
        .send_latest()
        .await?
        .ok_or_else(|| ApiError::not_found("Feed has no entries"))?;

    if !delivery.delivered {
        return Err(ApiError::delivery_failed(format!(
            "Webhook rejected notification for '{}'",
            delivery.entry.title
        )));
    }

    Ok(Json(ApiResponse::new(TestResponse {
        delivered: true,
        entry: delivery.entry,
    })))
}

/// Run one stop-at-known cycle.
pub async fn check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CycleReport>>, ApiError> {
    let report = state.cycle.run(Policy::StopAtKnown).await?;
    Ok(Json(ApiResponse::new(report)))
}

/// Record every current entry as seen without notifying.
pub async fn init(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CycleReport>>, ApiError> {
    let report = state.cycle.bootstrap().await?;
    if report.fetched == 0 {
        return Err(ApiError::not_found("Feed has no entries"));
    }
    Ok(Json(ApiResponse::new(report)))
}

/// Empty the store.
pub async fn clear(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ClearResponse>>, ApiError> {
    state.cycle.store().clear().await?;
    info!("Store cleared via trigger");
    Ok(Json(ApiResponse::new(ClearResponse { cleared: true })))
}

/// Store statistics.
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsResponse>> {
    let store = state.cycle.store();
    let stats = store.stats().await;
    let items = store.recent(STATS_RECENT).await;
    Json(ApiResponse::new(StatsResponse {
        total: stats.total,
        latest: stats.latest,
        items,
    }))
}

/// Health check handler.
pub async fn health_check() -> &'static str {
    "OK"
}

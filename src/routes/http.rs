// JSON handlers for devices, apps and alerts

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::error::MonitorError;
use crate::models::{
    AlertRecord, AlertRegistration, AlertsOverview, AppSummary, AppUsage, DeviceOverview,
    HistoryEntry, NodeReport,
};
use crate::version::{NAME, VERSION};

/// Maps core errors to HTTP status codes with a `{"error": "..."}` body.
pub(super) struct ApiError(MonitorError);

impl From<MonitorError> for ApiError {
    fn from(e: MonitorError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MonitorError::InvalidAlert(_)
            | MonitorError::InvalidReport(_)
            | MonitorError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            MonitorError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MonitorError::SinkNotConfigured(_) | MonitorError::Delivery(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        if status.is_server_error() {
            tracing::warn!(error = %self.0, status = status.as_u16(), "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LimitQuery {
    limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct TimeRangeQuery {
    start: Option<String>,
    end: Option<String>,
}

/// GET /version: service name and version from Cargo.toml.
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/devices: statuses with key-rate history. No limit means full history.
pub(super) async fn devices_handler(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<DeviceOverview>>, ApiError> {
    let limit = q.limit.unwrap_or(0).max(0) as usize;
    Ok(Json(state.history.device_overview(limit).await?))
}

/// POST /api/nodes: batch of node reports. Requires `X-Auth-Token`.
pub(super) async fn node_reports_handler(
    State(state): State<AppState>,
    Json(reports): Json<Vec<NodeReport>>,
) -> Result<StatusCode, ApiError> {
    state.history.record_node_reports(reports).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/apps: one app usage update. Requires `X-Auth-Token`.
pub(super) async fn app_usage_handler(
    State(state): State<AppState>,
    Json(usage): Json<AppUsage>,
) -> Result<StatusCode, ApiError> {
    state.history.record_app_usage(usage).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/apps: every app with its latest consumption history.
pub(super) async fn apps_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<AppSummary>>, ApiError> {
    Ok(Json(state.history.list_apps().await?))
}

/// GET /api/apps-timeline: full consumption history of every app between `start` and `end`.
pub(super) async fn apps_timeline_handler(
    State(state): State<AppState>,
    Query(q): Query<TimeRangeQuery>,
) -> Result<Json<Vec<AppSummary>>, ApiError> {
    let timeline = state
        .history
        .app_timeline(q.start.as_deref(), q.end.as_deref())
        .await?;
    Ok(Json(timeline))
}

/// GET /api/apps/{name}/history: consumption history, 10 entries unless `limit` is positive.
pub(super) async fn app_history_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let history = state
        .history
        .key_consumption_history(&name, q.limit.unwrap_or(0))
        .await?;
    Ok(Json(history))
}

/// GET /api/alerts: devices, alert levels and registered alerts.
pub(super) async fn alerts_overview_handler(
    State(state): State<AppState>,
) -> Result<Json<AlertsOverview>, ApiError> {
    Ok(Json(state.monitor.overview().await?))
}

/// POST /api/alerts: registers an alert and returns it with 201.
pub(super) async fn register_alert_handler(
    State(state): State<AppState>,
    Json(registration): Json<AlertRegistration>,
) -> Result<(StatusCode, Json<AlertRecord>), ApiError> {
    let alert = state.monitor.register(registration).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

/// GET /api/alerts/active: alerts whose device currently reports a failure.
pub(super) async fn active_alerts_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<AlertRecord>>, ApiError> {
    Ok(Json(state.monitor.active_alerts().await?))
}

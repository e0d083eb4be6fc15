// HTTP routes

mod auth;
mod http;

use axum::{
    Router, middleware,
    routing::{MethodRouter, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AuthConfig;
use crate::history::HistoryService;
use crate::monitor::AlertMonitor;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) history: Arc<HistoryService>,
    pub(crate) monitor: Arc<AlertMonitor>,
}

/// Wraps an ingestion route in the `X-Auth-Token` check.
fn guarded(route: MethodRouter<AppState>, token: &Arc<str>) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        token.clone(),
        auth::require_token,
    ))
}

pub fn app(history: Arc<HistoryService>, monitor: Arc<AlertMonitor>, auth: &AuthConfig) -> Router {
    let state = AppState { history, monitor };
    let token: Arc<str> = Arc::from(auth.token.trim());
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/devices", get(http::devices_handler)) // GET /api/devices?limit=N
        .route("/api/nodes", guarded(post(http::node_reports_handler), &token)) // POST /api/nodes
        .route(
            "/api/apps",
            get(http::apps_handler).merge(guarded(post(http::app_usage_handler), &token)),
        ) // GET, POST /api/apps
        .route("/api/apps-timeline", get(http::apps_timeline_handler)) // GET /api/apps-timeline?start=..&end=..
        .route("/api/apps/{name}/history", get(http::app_history_handler)) // GET /api/apps/{name}/history?limit=N
        .route(
            "/api/alerts",
            get(http::alerts_overview_handler).post(http::register_alert_handler),
        ) // GET, POST /api/alerts
        .route("/api/alerts/active", get(http::active_alerts_handler)) // GET /api/alerts/active
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

// Shared-token guard for the report ingestion endpoints

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub(super) const AUTH_HEADER: &str = "X-Auth-Token";

/// Token carried by a header value, with an optional case-insensitive `Bearer ` prefix.
fn presented_token(value: &str) -> &str {
    let value = value.trim();
    match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => value[7..].trim(),
        _ => value,
    }
}

/// Rejects requests whose `X-Auth-Token` is missing or differs from the configured token.
pub(super) async fn require_token(
    State(token): State<Arc<str>>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(presented_token)
        .unwrap_or_default();

    if presented.is_empty() || presented != &*token {
        tracing::debug!(path = %request.uri().path(), "rejected ingestion request");
        let body = Json(serde_json::json!({ "error": "invalid auth token" }));
        return (StatusCode::UNAUTHORIZED, body).into_response();
    }
    next.run(request).await
}

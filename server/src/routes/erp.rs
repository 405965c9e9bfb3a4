//! ERP pass-through for authenticated reads.

#[cfg(test)]
#[path = "erp_test.rs"]
mod erp_test;

use axum::extract::{Path, RawQuery, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use super::auth::{SessionToken, erp_error_to_status};
use crate::services::erp::ErpResponse;
use crate::state::AppState;

/// Relative ERP paths only. Dot segments, including percent-encoded ones,
/// and backslashes are refused before the URL is built.
fn is_forwardable(path: &str) -> bool {
    !path.is_empty() && !path.contains('\\') && path.split('/').all(|segment| !is_dot_segment(segment))
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn relay(upstream: ErpResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut resp = (status, upstream.body).into_response();
    if let Some(value) = upstream.content_type.and_then(|c| HeaderValue::from_str(&c).ok()) {
        resp.headers_mut().insert(CONTENT_TYPE, value);
    }
    resp
}

/// `GET /api/erp/{*path}`: forward to `{erp}/{path}` with the caller's token.
/// ERP statuses, including 401/403, come back unchanged.
pub async fn proxy(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    token: Result<SessionToken, StatusCode>,
) -> Response {
    let Ok(SessionToken(token)) = token else {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "missing session token" }))).into_response();
    };
    if !is_forwardable(&path) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid erp path" }))).into_response();
    }

    match state.erp.forward_get(&path, query.as_deref(), &token).await {
        Ok(upstream) => {
            tracing::debug!(%path, status = upstream.status, "erp pass-through");
            relay(upstream)
        }
        Err(e) => {
            tracing::warn!(%path, error = %e, "erp pass-through failed");
            (erp_error_to_status(&e), Json(json!({ "error": "erp unavailable" }))).into_response()
        }
    }
}

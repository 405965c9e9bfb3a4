//! Auth routes: ERP login proxy, token validation, logout.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser never talks to the ERP directly. These handlers forward
//! credentials and tokens and translate ERP answers into the statuses the
//! client's auth collaborator expects. The session cookie is written by the
//! client; the server only expires it on logout.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use session::{Credentials, SESSION_COOKIE};
use time::Duration;

use crate::services::erp::ErpError;
use crate::state::AppState;

// =============================================================================
// TOKEN EXTRACTOR
// =============================================================================

/// Caller's session token, from `Authorization: Bearer` or the session cookie.
/// The header wins when both are present.
pub struct SessionToken(pub String);

impl<S> axum::extract::FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if let Some(token) = bearer {
            return Ok(Self(token.to_owned()));
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(Self(token.to_owned()))
    }
}

/// HTTP status for an ERP failure seen by a MAOS route.
pub(crate) fn erp_error_to_status(err: &ErpError) -> StatusCode {
    match err {
        ErpError::Rejected => StatusCode::UNAUTHORIZED,
        ErpError::Path(_) => StatusCode::BAD_REQUEST,
        ErpError::Client(_) | ErpError::Unreachable(_) | ErpError::Status(_) | ErpError::InvalidSession(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/login`: exchange credentials at the ERP, return the session.
pub async fn login(State(state): State<AppState>, Json(credentials): Json<Credentials>) -> Response {
    match state.erp.authenticate(&credentials).await {
        Ok(session) => {
            tracing::info!(
                user_id = %session.user.id,
                tenant_id = %session.tenant.id,
                role = %session.role(),
                "login succeeded"
            );
            Json(session).into_response()
        }
        Err(ErpError::Rejected) => {
            tracing::info!(email = %credentials.email, "login rejected");
            error_body(StatusCode::UNAUTHORIZED, "invalid email or password")
        }
        Err(e) => {
            tracing::error!(error = %e, "erp login failed");
            error_body(erp_error_to_status(&e), "sign-in service unavailable")
        }
    }
}

/// `GET /api/auth/validate`: ask the ERP whether the caller's token is live.
pub async fn validate(State(state): State<AppState>, token: Result<SessionToken, StatusCode>) -> Response {
    let Ok(SessionToken(token)) = token else {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "valid": false }))).into_response();
    };

    match state.erp.validate(&token).await {
        Ok(true) => Json(json!({ "valid": true })).into_response(),
        Ok(false) => (StatusCode::UNAUTHORIZED, Json(json!({ "valid": false }))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "erp token validation failed");
            error_body(erp_error_to_status(&e), "token validation unavailable")
        }
    }
}

/// `POST /api/auth/logout`: revoke at the ERP (best effort), expire the cookie.
pub async fn logout(State(state): State<AppState>, token: Result<SessionToken, StatusCode>) -> impl IntoResponse {
    if let Ok(SessionToken(token)) = token {
        if let Err(e) = state.erp.revoke(&token).await {
            tracing::warn!(error = %e, "erp session revoke failed");
        }
    }

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(Duration::ZERO);

    (CookieJar::new().add(cookie), StatusCode::NO_CONTENT)
}

//! REST API helpers for communicating with the MAOS server.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR): stubs returning errors since these endpoints are only
//! meaningful in the browser.
//!
//! ERROR HANDLING
//! ==============
//! Auth calls surface `AuthError` so the auth context can tell a rejected
//! credential from an unreachable server. ERP reads return `Result<_, String>`
//! and report 401/403 to the auth context before failing.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use async_trait::async_trait;
use session::{AuthApi, AuthContext, AuthError, Credentials, Session};

#[cfg(any(test, feature = "hydrate"))]
const LOGIN_ENDPOINT: &str = "/api/auth/login";
#[cfg(any(test, feature = "hydrate"))]
const VALIDATE_ENDPOINT: &str = "/api/auth/validate";
#[cfg(feature = "hydrate")]
const LOGOUT_ENDPOINT: &str = "/api/auth/logout";

#[cfg(any(test, feature = "hydrate"))]
fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[cfg(any(test, feature = "hydrate"))]
fn erp_endpoint(path: &str) -> String {
    format!("/api/erp/{}", path.trim_start_matches('/'))
}

/// Map a non-success login response to an [`AuthError`].
#[cfg(any(test, feature = "hydrate"))]
fn login_failure(status: u16, body: &str) -> AuthError {
    match status {
        400 | 401 | 403 => {
            let message = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("error").and_then(serde_json::Value::as_str).map(str::to_owned))
                .unwrap_or_else(|| "invalid email or password".to_owned());
            AuthError::Rejected(message)
        }
        _ => AuthError::Upstream(format!("{LOGIN_ENDPOINT} failed: {status}")),
    }
}

/// Map a `/api/auth/validate` status to the collaborator contract.
#[cfg(any(test, feature = "hydrate"))]
fn validate_outcome(status: u16) -> Result<bool, AuthError> {
    match status {
        200..=299 => Ok(true),
        401 | 403 => Ok(false),
        other => Err(AuthError::Upstream(format!("{VALIDATE_ENDPOINT} failed: {other}"))),
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn erp_failure_message(path: &str, status: u16) -> String {
    format!("erp request {path} failed: {status}")
}

/// Auth collaborator backed by the MAOS server's `/api/auth/*` endpoints.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpAuthApi;

#[async_trait(?Send)]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        #[cfg(feature = "hydrate")]
        {
            let resp = gloo_net::http::Request::post(LOGIN_ENDPOINT)
                .json(credentials)
                .map_err(|e| AuthError::Network(e.to_string()))?
                .send()
                .await
                .map_err(|e| AuthError::Network(e.to_string()))?;
            if !resp.ok() {
                let body = resp.text().await.unwrap_or_default();
                return Err(login_failure(resp.status(), &body));
            }
            let body = resp.text().await.map_err(|e| AuthError::Network(e.to_string()))?;
            Ok(Session::from_json(&body)?)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = credentials;
            Err(AuthError::Network("not available on server".to_owned()))
        }
    }

    async fn validate_token(&self, token: &str) -> Result<bool, AuthError> {
        #[cfg(feature = "hydrate")]
        {
            let resp = gloo_net::http::Request::get(VALIDATE_ENDPOINT)
                .header("Authorization", &bearer(token))
                .send()
                .await
                .map_err(|e| AuthError::Network(e.to_string()))?;
            validate_outcome(resp.status())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = token;
            Err(AuthError::Network("not available on server".to_owned()))
        }
    }
}

/// Revoke `token` server-side by calling `POST /api/auth/logout`.
/// Best effort: the local session is already gone by the time this runs.
pub async fn revoke_session(token: String) {
    #[cfg(feature = "hydrate")]
    {
        let result = gloo_net::http::Request::post(LOGOUT_ENDPOINT)
            .header("Authorization", &bearer(&token))
            .send()
            .await;
        if let Err(e) = result {
            log::warn!("session revoke failed: {e}");
        }
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = token;
    }
}

/// Read an ERP resource through `GET /api/erp/{path}` with the current token.
///
/// A 401/403 answer invalidates the local session before the error returns.
///
/// # Errors
///
/// Returns an error string when no session is active, the request fails, or
/// the response is not success JSON.
pub async fn fetch_erp(auth: &AuthContext, path: &str) -> Result<serde_json::Value, String> {
    #[cfg(feature = "hydrate")]
    {
        let token = auth.bearer_token().ok_or_else(|| "not signed in".to_owned())?;
        let resp = gloo_net::http::Request::get(&erp_endpoint(path))
            .header("Authorization", &bearer(&token))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if auth.observe_status(resp.status()) || !resp.ok() {
            return Err(erp_failure_message(path, resp.status()));
        }
        resp.json::<serde_json::Value>().await.map_err(|e| e.to_string())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (auth, path);
        Err("not available on server".to_owned())
    }
}

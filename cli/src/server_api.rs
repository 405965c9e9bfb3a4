//! HTTP client for a running MAOS server.
//!
//! Implements the auth collaborator over `/api/auth/*` so the CLI drives the
//! same auth context as the browser, and adds revoke and ERP reads.

#[cfg(test)]
#[path = "server_api_test.rs"]
pub(crate) mod server_api_test;

use async_trait::async_trait;
use serde_json::Value;
use session::{AuthApi, AuthError, Credentials, Session};

pub struct ServerAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl ServerAuthApi {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_owned() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `POST /api/auth/logout` with `token` as bearer.
    ///
    /// # Errors
    ///
    /// Returns the transport error; the server answers 204 regardless of the
    /// token's state.
    pub async fn revoke(&self, token: &str) -> Result<(), reqwest::Error> {
        self.http
            .post(self.url("/api/auth/logout"))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// `GET /api/erp/{path}` with `token` as bearer. Returns status and JSON
    /// body (`Null` when the body is not JSON).
    ///
    /// # Errors
    ///
    /// Returns the transport error when no response arrives.
    pub async fn erp_get(&self, path: &str, token: &str) -> Result<(u16, Value), reqwest::Error> {
        let resp = self
            .http
            .get(self.url(&format!("/api/erp/{}", path.trim_start_matches('/'))))
            .bearer_auth(token)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// `GET /healthz`.
    ///
    /// # Errors
    ///
    /// Returns the transport error or the non-success status as an error.
    pub async fn ping(&self) -> Result<(), reqwest::Error> {
        self.http.get(self.url("/healthz")).send().await?.error_for_status()?;
        Ok(())
    }
}

fn network(err: reqwest::Error) -> AuthError {
    AuthError::Network(err.to_string())
}

#[async_trait(?Send)]
impl AuthApi for ServerAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let resp = self
            .http
            .post(self.url("/api/auth/login"))
            .json(credentials)
            .send()
            .await
            .map_err(network)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(network)?;
        match status {
            200..=299 => Ok(Session::from_json(&body)?),
            400 | 401 | 403 => {
                let message = serde_json::from_str::<Value>(&body)
                    .ok()
                    .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
                    .unwrap_or_else(|| "invalid email or password".to_owned());
                Err(AuthError::Rejected(message))
            }
            other => Err(AuthError::Upstream(format!("login failed: {other}"))),
        }
    }

    async fn validate_token(&self, token: &str) -> Result<bool, AuthError> {
        let resp = self
            .http
            .get(self.url("/api/auth/validate"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network)?;
        match resp.status().as_u16() {
            200..=299 => Ok(true),
            401 | 403 => Ok(false),
            other => Err(AuthError::Upstream(format!("validate failed: {other}"))),
        }
    }
}

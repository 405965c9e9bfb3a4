//! ERP client: credential exchange, token validation, revocation, and
//! pass-through reads.
//!
//! SYSTEM CONTEXT
//! ==============
//! The ERP is the identity provider and system of record. MAOS never stores
//! tokens server-side; every call carries the caller's bearer token and the
//! ERP decides whether it is still good.
//!
//! ERROR HANDLING
//! ==============
//! 401/403 from the ERP are answers, not failures: login maps them to
//! `Rejected` and validation to `Ok(false)`. Transport problems and other
//! statuses surface as errors so callers can answer 502 instead of logging
//! the user out on a flaky upstream.

#[cfg(test)]
#[path = "erp_test.rs"]
mod erp_test;

use std::time::Duration;

use async_trait::async_trait;
use session::{AuthApi, AuthError, Credentials, Session, SessionError};

#[derive(Debug, thiserror::Error)]
pub enum ErpError {
    #[error("erp client setup failed: {0}")]
    Client(String),
    #[error("erp unreachable: {0}")]
    Unreachable(String),
    #[error("erp rejected the credentials")]
    Rejected,
    #[error("erp returned status {0}")]
    Status(u16),
    #[error("erp returned an invalid session: {0}")]
    InvalidSession(#[from] SessionError),
    #[error("erp path resolves outside the base url: {0}")]
    Path(String),
}

impl From<ErpError> for AuthError {
    fn from(err: ErpError) -> Self {
        match err {
            ErpError::Rejected => AuthError::Rejected("invalid email or password".to_owned()),
            ErpError::Unreachable(msg) | ErpError::Client(msg) => AuthError::Network(msg),
            ErpError::Status(status) => AuthError::Upstream(format!("erp returned status {status}")),
            ErpError::InvalidSession(e) => AuthError::InvalidSession(e),
            ErpError::Path(path) => AuthError::Upstream(format!("invalid erp path {path}")),
        }
    }
}

/// Raw upstream answer relayed by the pass-through route.
#[derive(Debug)]
pub struct ErpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

pub struct ErpClient {
    http: reqwest::Client,
    base_url: String,
    base: reqwest::Url,
}

impl ErpClient {
    /// Build a client for `base_url` (no trailing slash) with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Client`] if `base_url` does not parse or the TLS
    /// backend cannot be initialized.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ErpError> {
        let base_url = base_url.into();
        let base = reqwest::Url::parse(&base_url).map_err(|e| ErpError::Client(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ErpError::Client(e.to_string()))?;
        Ok(Self { http, base_url, base })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Resolve a caller-supplied pass-through path under the base URL.
    ///
    /// Segments are appended one by one so `%` and `\` are re-encoded
    /// rather than interpreted. The result must still sit below the base path.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Path`] when the resolved URL leaves the base path.
    pub fn pass_through_url(&self, path: &str, query: Option<&str>) -> Result<reqwest::Url, ErpError> {
        let escaped = || ErpError::Path(path.to_owned());
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| escaped())?
            .pop_if_empty()
            .extend(path.trim_start_matches('/').split('/'));
        url.set_query(query.filter(|q| !q.is_empty()));

        let root = format!("{}/", self.base.path().trim_end_matches('/'));
        if !url.path().starts_with(&root) || url.path().len() == root.len() {
            return Err(escaped());
        }
        Ok(url)
    }

    /// `POST {erp}/auth/login` with the credentials.
    ///
    /// # Errors
    ///
    /// [`ErpError::Rejected`] for 400/401/403, [`ErpError::Status`] for any
    /// other non-success, [`ErpError::InvalidSession`] for a body that is not
    /// a complete session.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, ErpError> {
        let resp = self
            .http
            .post(self.url("auth/login"))
            .json(credentials)
            .send()
            .await
            .map_err(|e| ErpError::Unreachable(e.to_string()))?;

        let status = resp.status().as_u16();
        match status {
            200..=299 => {}
            400 | 401 | 403 => return Err(ErpError::Rejected),
            other => return Err(ErpError::Status(other)),
        }

        let body = resp.text().await.map_err(|e| ErpError::Unreachable(e.to_string()))?;
        Ok(Session::from_json(&body)?)
    }

    /// `GET {erp}/auth/validate` with `token` as bearer.
    ///
    /// # Errors
    ///
    /// Returns an error when the ERP cannot answer; a refused token is `Ok(false)`.
    pub async fn validate(&self, token: &str) -> Result<bool, ErpError> {
        let resp = self
            .http
            .get(self.url("auth/validate"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ErpError::Unreachable(e.to_string()))?;

        match resp.status().as_u16() {
            200..=299 => Ok(true),
            401 | 403 => Ok(false),
            other => Err(ErpError::Status(other)),
        }
    }

    /// `POST {erp}/auth/logout` with `token` as bearer.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures and non-success statuses other
    /// than 401/403, which mean the token was already dead.
    pub async fn revoke(&self, token: &str) -> Result<(), ErpError> {
        let resp = self
            .http
            .post(self.url("auth/logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ErpError::Unreachable(e.to_string()))?;

        match resp.status().as_u16() {
            200..=299 | 401 | 403 => Ok(()),
            other => Err(ErpError::Status(other)),
        }
    }

    /// `GET {erp}/{path}?{query}` with `token` as bearer, relayed unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Path`] for a path that escapes the base URL and
    /// [`ErpError::Unreachable`] when no response arrives; every upstream
    /// status is returned in the [`ErpResponse`].
    pub async fn forward_get(&self, path: &str, query: Option<&str>, token: &str) -> Result<ErpResponse, ErpError> {
        let url = self.pass_through_url(path, query)?;

        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ErpError::Unreachable(e.to_string()))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp
            .bytes()
            .await
            .map_err(|e| ErpError::Unreachable(e.to_string()))?
            .to_vec();
        Ok(ErpResponse { status, content_type, body })
    }
}

#[async_trait(?Send)]
impl AuthApi for ErpClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        Ok(self.authenticate(credentials).await?)
    }

    async fn validate_token(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.validate(token).await?)
    }
}

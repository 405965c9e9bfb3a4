//! Session data model shared by the edge and render guards.
//!
//! DESIGN
//! ======
//! A session is either fully populated or absent. Deserialization goes
//! through an unchecked wire struct and is rejected with a typed
//! [`SessionError`] when any identifying field is empty or the role is not
//! one of the known [`Role`] variants, so a half-written blob can never be
//! mistaken for a live session.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a session payload cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The role string is not part of the closed [`Role`] set.
    #[error("unknown role: {0}")]
    UnknownRole(String),
    /// A required identifying field was empty.
    #[error("session field `{0}` is empty")]
    EmptyField(&'static str),
    /// The payload was not valid session JSON.
    #[error("malformed session payload: {0}")]
    Malformed(String),
}

/// Tenant membership role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    Owner,
    Admin,
    Manager,
    Viewer,
}

impl Role {
    /// Every role, in descending order of privilege.
    pub const ALL: [Role; 4] = [Role::Owner, Role::Admin, Role::Manager, Role::Viewer];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "viewer" => Ok(Self::Viewer),
            _ => Err(SessionError::UnknownRole(raw.to_owned())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = SessionError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

/// Tenant the session is scoped to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub role: Role,
}

/// Authenticated user profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// A fully populated authenticated session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SessionWire")]
pub struct Session {
    /// Opaque bearer token issued by the ERP.
    pub token: String,
    pub tenant: Tenant,
    pub user: User,
}

// Token stays out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("tenant", &self.tenant)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Deserialize)]
struct SessionWire {
    token: String,
    tenant: TenantWire,
    user: User,
}

#[derive(Deserialize)]
struct TenantWire {
    id: String,
    role: String,
}

impl TryFrom<SessionWire> for Session {
    type Error = SessionError;

    fn try_from(wire: SessionWire) -> Result<Self, Self::Error> {
        let role = wire.tenant.role.parse()?;
        Session::new(wire.token, Tenant { id: wire.tenant.id, role }, wire.user)
    }
}

impl Session {
    /// Build a session, rejecting empty identifying fields.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyField`] naming the first empty field.
    pub fn new(token: String, tenant: Tenant, user: User) -> Result<Self, SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyField("token"));
        }
        if tenant.id.trim().is_empty() {
            return Err(SessionError::EmptyField("tenant.id"));
        }
        if user.id.trim().is_empty() {
            return Err(SessionError::EmptyField("user.id"));
        }
        Ok(Self { token, tenant, user })
    }

    /// Decode a session from its JSON storage form.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownRole`] or [`SessionError::EmptyField`]
    /// for well-formed JSON that violates the session invariants, and
    /// [`SessionError::Malformed`] for anything else.
    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        let wire: SessionWire = serde_json::from_str(raw).map_err(|e| SessionError::Malformed(e.to_string()))?;
        Session::try_from(wire)
    }

    /// Encode the session for durable storage.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Malformed`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|e| SessionError::Malformed(e.to_string()))
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.tenant.role
    }
}

/// Login credentials forwarded to the auth collaborator.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

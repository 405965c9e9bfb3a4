//! Render-time access decision for protected views.
//!
//! SYSTEM CONTEXT
//! ==============
//! The edge guard only sees whether a token cookie exists. This check runs
//! against the resolved [`AuthSnapshot`], so it catches sessions the server
//! revoked after the cookie was issued and enforces tenant roles.

#[cfg(test)]
#[path = "access_test.rs"]
mod access_test;

use crate::context::{AuthPhase, AuthSnapshot};
use crate::model::Role;
use crate::route::RouteTable;

/// What a protected view should render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteAccess {
    /// Auth state not resolved yet. Render a loading indicator, never navigate.
    Checking,
    /// No live session; navigate to the contained login URL.
    Redirecting(String),
    /// Signed in, but the tenant role is not allowed here.
    Forbidden,
    Allowed,
}

/// Decide access for `current_path`. An empty `required_roles` admits any
/// authenticated user.
#[must_use]
pub fn evaluate(snapshot: &AuthSnapshot, required_roles: &[Role], current_path: &str, table: &RouteTable) -> RouteAccess {
    match snapshot.phase() {
        AuthPhase::Unknown | AuthPhase::Loading => RouteAccess::Checking,
        AuthPhase::Unauthenticated => RouteAccess::Redirecting(table.login_redirect(current_path)),
        AuthPhase::Authenticated { tenant, .. } => {
            if required_roles.is_empty() || required_roles.contains(&tenant.role) {
                RouteAccess::Allowed
            } else {
                RouteAccess::Forbidden
            }
        }
    }
}

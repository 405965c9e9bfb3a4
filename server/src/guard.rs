//! Edge route guard for page requests.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs before SSR on every page navigation. It only checks whether a
//! `session_token` cookie is present; whether the token is still valid is
//! settled later by the client's hydration check and by the ERP on API calls.
//!
//! DESIGN
//! ======
//! The layer wraps only the page router. API routes, `/healthz`, and `/pkg`
//! assets are merged outside it, so they never reach this code.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use session::{GuardDecision, RouteTable, SESSION_COOKIE, decide};

/// Wrap `pages` so every request passes the edge guard first.
pub fn guard_pages(pages: Router, table: Arc<RouteTable>) -> Router {
    pages.layer(middleware::from_fn_with_state(table, route_guard))
}

async fn route_guard(State(table): State<Arc<RouteTable>>, jar: CookieJar, request: Request, next: Next) -> Response {
    let has_token = jar.get(SESSION_COOKIE).map(Cookie::value).is_some_and(|v| !v.is_empty());
    let path = request.uri().path().to_owned();

    match decide(&table, &path, has_token) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect(target) => {
            tracing::debug!(%path, %target, has_token, "route guard redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}

//! Render-time route guard.
//!
//! DESIGN
//! ======
//! Access is a memo over the auth snapshot and the current path, so children
//! mount once and only re-render when the decision itself changes. Navigation
//! happens only for a redirect decision, and replaces the history entry so
//! the back button does not return to a page the user cannot see.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::components::A;
use leptos_router::hooks::{use_location, use_navigate};
use session::{Role, RouteAccess, RouteTable, evaluate};

use crate::state::auth::use_auth;

/// Render `children` only for an authenticated user whose tenant role is in
/// `roles` (any role when empty).
#[component]
pub fn ProtectedRoute(#[prop(optional)] roles: Vec<Role>, children: ChildrenFn) -> impl IntoView {
    let auth = use_auth();
    let table = expect_context::<RouteTable>();
    let location = use_location();
    let navigate = use_navigate();

    let access = Memo::new(move |_| evaluate(&auth.get(), &roles, &location.pathname.get(), &table));

    Effect::new(move || {
        if let RouteAccess::Redirecting(target) = access.get() {
            navigate(&target, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    move || match access.get() {
        RouteAccess::Allowed => children().into_any(),
        RouteAccess::Forbidden => view! { <Forbidden/> }.into_any(),
        RouteAccess::Checking | RouteAccess::Redirecting(_) => view! {
            <div class="auth-checking" aria-busy="true">
                "Checking session..."
            </div>
        }
        .into_any(),
    }
}

#[component]
fn Forbidden() -> impl IntoView {
    let auth = use_auth();
    let landing = expect_context::<RouteTable>().landing_path().to_owned();
    let role = move || auth.get().role().map(|r| r.to_string()).unwrap_or_default();

    view! {
        <section class="forbidden">
            <h1>"Access denied"</h1>
            <p>"Your role (" {role} ") cannot open this page."</p>
            <A href=landing>"Back to start page"</A>
        </section>
    }
}

//! Auth-session state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `provide_auth` builds the single `AuthContext` for the app, wires its
//! subscriber into an `RwSignal<AuthSnapshot>`, and places both plus the
//! route table in Leptos context. Route guards and user-aware components read
//! the signal; actions go through the context.
//!
//! DESIGN
//! ======
//! The subscription guard and the context's teardown are tied to the owner's
//! cleanup, so a response arriving after unmount cannot touch disposed
//! signals.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use leptos::prelude::*;
use session::{AuthContext, AuthSnapshot, RouteTable, SessionStore};

use crate::net::api::HttpAuthApi;
use crate::util::storage::{CookieBackend, LocalStorageBackend};

/// Build the auth context, provide it, and start hydration in the browser.
///
/// Provides `AuthContext`, `RwSignal<AuthSnapshot>` and `RouteTable`. A route
/// table already in context (set by the server during SSR) is reused.
pub fn provide_auth() -> RwSignal<AuthSnapshot> {
    let table = use_context::<RouteTable>().unwrap_or_default();
    let store = SessionStore::new(CookieBackend::default(), LocalStorageBackend::default());
    let ctx = AuthContext::new(store, Arc::new(HttpAuthApi));
    let snapshot = RwSignal::new(ctx.snapshot());

    let subscription = ctx.subscribe(move |next: &AuthSnapshot| {
        snapshot.try_update(|current| accept_snapshot(current, next));
    });

    let teardown = ctx.clone();
    on_cleanup(move || {
        drop(subscription);
        teardown.close();
    });

    provide_context(table);
    provide_context(ctx.clone());
    provide_context(snapshot);

    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(async move {
        ctx.hydrate().await;
    });

    snapshot
}

/// Replace `current` with `next` unless `next` is older. Notifications can
/// arrive out of order when a transition races a subscriber callback.
fn accept_snapshot(current: &mut AuthSnapshot, next: &AuthSnapshot) -> bool {
    if next.revision() <= current.revision() {
        return false;
    }
    *current = next.clone();
    true
}

/// Current auth snapshot signal from context.
///
/// # Panics
///
/// Panics if called outside a tree set up by [`provide_auth`].
pub fn use_auth() -> RwSignal<AuthSnapshot> {
    expect_context::<RwSignal<AuthSnapshot>>()
}

//! Login page for email + password sign-in against the ERP.
//!
//! SYSTEM CONTEXT
//! ==============
//! Auth-only route: the edge guard sends visitors with a session cookie to
//! the landing page, and the effect below does the same once hydration
//! resolves a live session. After a successful login the same effect moves
//! the user to the sanitized `redirect` query target.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_query_map};
use session::{AuthContext, AuthError, Credentials, RouteTable, sanitize_redirect};

use crate::state::auth::use_auth;

/// Trim and check the form fields before contacting the server.
fn validate_login_input(email: &str, password: &str) -> Result<Credentials, &'static str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err("Enter both email and password.");
    }
    if !email.contains('@') {
        return Err("Enter a valid email address.");
    }
    Ok(Credentials::new(email, password))
}

/// User-facing text for a failed login.
#[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
fn login_error_message(err: &AuthError) -> String {
    match err {
        AuthError::Rejected(reason) => reason.clone(),
        AuthError::Network(_) => "Cannot reach the server. Try again.".to_owned(),
        AuthError::Upstream(_) => "Sign-in service unavailable. Try again later.".to_owned(),
        AuthError::InvalidSession(_) => "Sign-in returned an unusable session.".to_owned(),
        AuthError::Persistence(_) => "This browser refused to store the session. Check cookie settings.".to_owned(),
        AuthError::Superseded => "Sign-in was cancelled.".to_owned(),
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let ctx = expect_context::<AuthContext>();
    let table = expect_context::<RouteTable>();
    let query = use_query_map();
    let navigate = use_navigate();

    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    let target = Memo::new(move |_| query.with(|q| sanitize_redirect(q.get("redirect").as_deref(), &table)));

    Effect::new(move || {
        if auth.get().is_logged_in() {
            navigate(&target.get(), NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let credentials = match validate_login_input(&email.get(), &password.get()) {
            Ok(credentials) => credentials,
            Err(message) => {
                info.set(message.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set("Signing in...".to_owned());

        #[cfg(feature = "hydrate")]
        {
            let ctx = ctx.clone();
            leptos::task::spawn_local(async move {
                let message = match ctx.login(&credentials).await {
                    Ok(()) => String::new(),
                    Err(e) => login_error_message(&e),
                };
                let _ = info.try_set(message);
                let _ = busy.try_set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (&ctx, credentials);
        }
    };

    view! {
        <section class="login">
            <h1>"Sign in"</h1>
            <form class="login__form" on:submit=on_submit>
                <label>
                    "Email"
                    <input
                        type="email"
                        autocomplete="username"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                </label>
                <label>
                    "Password"
                    <input
                        type="password"
                        autocomplete="current-password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                </label>
                <button class="btn btn--primary" type="submit" disabled=move || busy.get()>
                    "Sign in"
                </button>
            </form>
            <Show when=move || !info.get().is_empty()>
                <p class="login__info">{move || info.get()}</p>
            </Show>
        </section>
    }
}

//! Top navigation bar with the signed-in identity and logout.

use leptos::prelude::*;
use leptos_router::components::A;
use session::AuthContext;

use crate::state::auth::use_auth;

#[component]
pub fn NavBar() -> impl IntoView {
    let auth = use_auth();
    let ctx = expect_context::<AuthContext>();

    // Local session goes first; the server-side revoke is fire-and-forget.
    let on_logout = move |_: leptos::ev::MouseEvent| {
        let token = ctx.logout();
        #[cfg(feature = "hydrate")]
        if let Some(token) = token {
            leptos::task::spawn_local(crate::net::api::revoke_session(token));
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = token;
    };

    let user_name = move || auth.get().user().map(|u| u.name.clone());

    view! {
        <nav class="nav-bar">
            <A href="/">"MAOS"</A>
            <Show
                when=move || auth.get().is_logged_in()
                fallback=|| view! { <A href="/login">"Sign in"</A> }
            >
                <A href="/dashboard">"Dashboard"</A>
                <span class="nav-bar__user">{user_name}</span>
                <button class="btn" on:click=on_logout.clone()>
                    "Log out"
                </button>
            </Show>
        </nav>
    }
}

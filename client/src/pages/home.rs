//! Public landing page.

use leptos::prelude::*;
use leptos_router::components::A;

use crate::state::auth::use_auth;

#[component]
pub fn HomePage() -> impl IntoView {
    let auth = use_auth();

    view! {
        <section class="home">
            <h1>"MAOS"</h1>
            <p>"Operations workspace for your ERP tenant."</p>
            <Show
                when=move || auth.get().is_logged_in()
                fallback=|| view! { <A href="/login">"Sign in"</A> }
            >
                <A href="/dashboard">"Open dashboard"</A>
            </Show>
        </section>
    }
}

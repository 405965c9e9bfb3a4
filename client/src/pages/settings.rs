//! Tenant settings overview, limited to owners and admins by the route.

use leptos::prelude::*;

use crate::state::auth::use_auth;

#[component]
pub fn SettingsPage() -> impl IntoView {
    let auth = use_auth();
    let tenant_id = move || auth.get().tenant().map(|t| t.id.clone()).unwrap_or_default();
    let role = move || auth.get().role().map(|r| r.to_string()).unwrap_or_default();

    view! {
        <section class="settings">
            <h1>"Tenant settings"</h1>
            <dl>
                <dt>"Tenant"</dt>
                <dd>{tenant_id}</dd>
                <dt>"Your role"</dt>
                <dd>{role}</dd>
            </dl>
        </section>
    }
}

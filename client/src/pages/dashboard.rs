//! Dashboard page showing the signed-in identity and tenant KPIs.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is the authenticated landing route. KPIs come from the ERP through
//! the server pass-through; a 401/403 there invalidates the session and the
//! surrounding `ProtectedRoute` sends the user to login.

use leptos::prelude::*;

use crate::state::auth::use_auth;

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();
    let kpis = RwSignal::new(None::<Result<serde_json::Value, String>>);

    #[cfg(feature = "hydrate")]
    {
        let ctx = expect_context::<session::AuthContext>();
        leptos::task::spawn_local(async move {
            let result = crate::net::api::fetch_erp(&ctx, "kpis").await;
            let _ = kpis.try_set(Some(result));
        });
    }

    let greeting = move || {
        auth.get()
            .user()
            .map(|u| format!("Welcome, {}", u.name))
            .unwrap_or_default()
    };
    let role = move || auth.get().role().map(|r| r.to_string()).unwrap_or_default();

    view! {
        <section class="dashboard">
            <h1>{greeting}</h1>
            <p class="dashboard__role">"Role: " {role}</p>
            <h2>"KPIs"</h2>
            {move || match kpis.get() {
                None => view! { <p>"Loading..."</p> }.into_any(),
                Some(Ok(value)) => {
                    let text = serde_json::to_string_pretty(&value).unwrap_or_default();
                    view! { <pre class="dashboard__kpis">{text}</pre> }.into_any()
                }
                Some(Err(e)) => view! { <p class="error">{e}</p> }.into_any(),
            }}
        </section>
    }
}

//! Root component, HTML shell, and route table.
//!
//! SYSTEM CONTEXT
//! ==============
//! The server renders `shell` for every page request that passed the edge
//! guard; the browser hydrates `App`. Protected pages are wrapped in
//! `ProtectedRoute`, which re-checks the session once auth has resolved.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Title, provide_meta_context};
use leptos_router::StaticSegment;
use leptos_router::components::{Route, Router, Routes};
use session::Role;

use crate::components::nav_bar::NavBar;
use crate::components::protected_route::ProtectedRoute;
use crate::pages::dashboard::DashboardPage;
use crate::pages::home::HomePage;
use crate::pages::login::LoginPage;
use crate::pages::not_found::NotFoundPage;
use crate::pages::settings::SettingsPage;
use crate::state::auth::provide_auth;

/// Roles allowed on the tenant settings page.
const SETTINGS_ROLES: [Role; 2] = [Role::Owner, Role::Admin];

/// HTML document wrapper used by SSR.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    provide_auth();

    view! {
        <Title text="MAOS"/>
        <Router>
            <NavBar/>
            <main class="app-main">
                <Routes fallback=|| view! { <NotFoundPage/> }>
                    <Route path=StaticSegment("") view=HomePage/>
                    <Route path=StaticSegment("login") view=LoginPage/>
                    <Route
                        path=StaticSegment("dashboard")
                        view=|| view! { <ProtectedRoute><DashboardPage/></ProtectedRoute> }
                    />
                    <Route
                        path=StaticSegment("settings")
                        view=|| {
                            view! {
                                <ProtectedRoute roles=SETTINGS_ROLES.to_vec()>
                                    <SettingsPage/>
                                </ProtectedRoute>
                            }
                        }
                    />
                </Routes>
            </main>
        </Router>
    }
}

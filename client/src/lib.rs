//! MAOS front-end: Leptos app shell, auth provider, and route guards.
//!
//! SYSTEM CONTEXT
//! ==============
//! Compiled twice: with `ssr` into the server for rendering, and with
//! `hydrate` into WASM for the browser. Browser-only code sits behind the
//! `hydrate` feature and degrades to no-ops on the server.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: hydrate the server-rendered document.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}

//! Reactive state shared across the client.
//!
//! SYSTEM CONTEXT
//! ==============
//! State lives in Leptos context. `auth` bridges the shared auth context into
//! signals so components re-render on every auth transition.

pub mod auth;

//! Route-level page components.
//!
//! SYSTEM CONTEXT
//! ==============
//! `home` is public, `login` is auth-only, `dashboard` and `settings` render
//! inside `ProtectedRoute`.

pub mod dashboard;
pub mod home;
pub mod login;
pub mod not_found;
pub mod settings;

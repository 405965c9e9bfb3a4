//! Upstream services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own upstream protocol details so route handlers can stay
//! focused on request translation and status mapping.

pub mod erp;

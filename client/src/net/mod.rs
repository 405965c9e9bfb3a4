//! Networking modules for the MAOS HTTP API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` wraps the server's `/api/auth/*` and `/api/erp/*` endpoints and
//! implements the auth collaborator used by the shared auth context.

pub mod api;

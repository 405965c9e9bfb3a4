//! Session model, route gating, and auth state machine for the MAOS dashboard.
//!
//! This crate owns everything the `server` edge guard and the `client` render
//! guard must agree on: how a path is classified, what a session looks like
//! on the wire, how it is persisted to the cookie and durable storage, and
//! how the auth context moves between states. It has no browser or HTTP code;
//! storage targets and the auth collaborator are injected through traits.

pub mod access;
pub mod context;
pub mod model;
pub mod route;
pub mod store;

pub use access::{RouteAccess, evaluate};
pub use context::{AuthApi, AuthContext, AuthError, AuthPhase, AuthSnapshot, Subscription};
pub use model::{Credentials, Role, Session, SessionError, Tenant, User};
pub use route::{GuardDecision, RouteClass, RouteTable, RouteTableError, decide, sanitize_redirect};
pub use store::{MemoryBackend, PersistenceError, SessionBackend, SessionStore, StorageError};

/// Cookie observed by the edge guard.
pub const SESSION_COOKIE: &str = "session_token";

/// Durable storage key holding the JSON-encoded session.
pub const SESSION_STORAGE_KEY: &str = "maos_session";

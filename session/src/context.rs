//! Auth context: the state machine every auth-aware view reads.
//!
//! ARCHITECTURE
//! ============
//! `Unknown -> Loading -> {Authenticated, Unauthenticated}`. The context is
//! the only writer of the [`SessionStore`]; every transition that touches the
//! store happens under the state lock, so the persisted session and the
//! in-memory phase never disagree. A session restored from durable storage
//! alone is written back so the cookie the edge guard reads reappears.
//!
//! CONCURRENCY
//! ===========
//! `hydrate` and `login` are the only suspension points. Each captures the
//! epoch when it starts; `logout`, `invalidate`, a newer `login` and `close`
//! bump it. A completion whose epoch is stale is dropped, so a logout issued
//! while a login is in flight always wins. Listeners run after the lock is
//! released and may call back into the context.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;

use crate::model::{Credentials, Role, Session, SessionError, Tenant, User};
use crate::store::{PersistenceError, SessionStore};

/// Error surfaced by [`AuthContext::login`] and the [`AuthApi`] collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The auth service refused the credentials.
    #[error("credentials rejected: {0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(String),
    /// The auth service answered with an unexpected status or body.
    #[error("auth service error: {0}")]
    Upstream(String),
    #[error("auth service returned an invalid session: {0}")]
    InvalidSession(#[from] SessionError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// A logout, newer login, or teardown happened while this call was in flight.
    #[error("superseded by a newer auth operation")]
    Superseded,
}

/// External auth collaborator.
///
/// Futures are not required to be `Send` so browser HTTP clients qualify.
#[async_trait(?Send)]
pub trait AuthApi {
    /// Exchange credentials for a session.
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Check whether `token` is still accepted. `Ok(false)` means rejected;
    /// `Err` means the answer is unknown.
    async fn validate_token(&self, token: &str) -> Result<bool, AuthError>;
}

/// Auth lifecycle phase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthPhase {
    /// Nothing has been loaded yet.
    #[default]
    Unknown,
    /// Stored session is being loaded and verified.
    Loading,
    Authenticated { user: User, tenant: Tenant },
    Unauthenticated,
}

/// Immutable view of the context at one revision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    phase: AuthPhase,
    revision: u64,
}

impl AuthSnapshot {
    #[must_use]
    pub fn new(phase: AuthPhase, revision: u64) -> Self {
        Self { phase, revision }
    }

    #[must_use]
    pub fn phase(&self) -> &AuthPhase {
        &self.phase
    }

    /// Increases by one on every transition.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, AuthPhase::Loading)
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        matches!(self.phase, AuthPhase::Authenticated { .. })
    }

    /// `true` once the stored session has been resolved either way.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self.phase, AuthPhase::Authenticated { .. } | AuthPhase::Unauthenticated)
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match &self.phase {
            AuthPhase::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn tenant(&self) -> Option<&Tenant> {
        match &self.phase {
            AuthPhase::Authenticated { tenant, .. } => Some(tenant),
            _ => None,
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.tenant().map(|t| t.role)
    }
}

type Listener = Arc<dyn Fn(&AuthSnapshot) + Send + Sync>;

struct Inner {
    phase: AuthPhase,
    revision: u64,
    epoch: u64,
    token: Option<String>,
    closed: bool,
}

impl Inner {
    fn commit(&mut self, phase: AuthPhase) -> AuthSnapshot {
        self.phase = phase;
        self.revision += 1;
        AuthSnapshot { phase: self.phase.clone(), revision: self.revision }
    }
}

struct Shared {
    state: Mutex<Inner>,
    store: SessionStore,
    api: Arc<dyn AuthApi + Send + Sync>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener: AtomicU64,
}

/// Shared handle to the auth state machine. Clones refer to the same state.
#[derive(Clone)]
pub struct AuthContext {
    shared: Arc<Shared>,
}

impl AuthContext {
    #[must_use]
    pub fn new(store: SessionStore, api: Arc<dyn AuthApi + Send + Sync>) -> Self {
        let inner = Inner { phase: AuthPhase::Unknown, revision: 0, epoch: 0, token: None, closed: false };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(inner),
                store,
                api,
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        let inner = self.lock();
        AuthSnapshot { phase: inner.phase.clone(), revision: inner.revision }
    }

    /// Bearer token of the current session, if authenticated.
    #[must_use]
    pub fn bearer_token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// Register `listener` for every future transition.
    ///
    /// Dropping the returned [`Subscription`] unregisters it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthSnapshot) + Send + Sync + 'static,
    {
        let id = self.shared.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners().push((id, Arc::new(listener)));
        Subscription { shared: Arc::downgrade(&self.shared), id }
    }

    /// Resolve the initial phase from the stored session.
    ///
    /// A stored token is verified with the collaborator; a rejected token or
    /// a failed check clears the store and ends `Unauthenticated`. No-op
    /// unless the context is still `Unknown`.
    pub async fn hydrate(&self) {
        let (epoch, stored) = {
            let mut inner = self.lock();
            if inner.closed || inner.phase != AuthPhase::Unknown {
                return;
            }
            inner.epoch += 1;
            let snapshot = inner.commit(AuthPhase::Loading);
            let stored = self.shared.store.load();
            let epoch = inner.epoch;
            drop(inner);
            self.notify(&snapshot);
            (epoch, stored)
        };

        let verdict = match &stored {
            Some(session) => Some(self.shared.api.validate_token(&session.token).await),
            None => None,
        };

        let mut inner = self.lock();
        if inner.closed || inner.epoch != epoch {
            tracing::debug!(epoch, "discarding superseded session check");
            return;
        }
        let phase = match (stored, verdict) {
            (Some(session), Some(Ok(true))) => match self.shared.store.save(&session) {
                // Re-saving restores a cookie lost while the durable copy survived.
                Ok(()) => {
                    tracing::info!(user_id = %session.user.id, tenant_id = %session.tenant.id, "session restored");
                    inner.token = Some(session.token);
                    AuthPhase::Authenticated { user: session.user, tenant: session.tenant }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not re-persist restored session");
                    AuthPhase::Unauthenticated
                }
            },
            (Some(_), Some(Ok(false))) => {
                tracing::info!("stored session rejected by auth service");
                self.clear_store();
                AuthPhase::Unauthenticated
            }
            (Some(_), Some(Err(e))) => {
                tracing::warn!(error = %e, "session check failed, treating as signed out");
                self.clear_store();
                AuthPhase::Unauthenticated
            }
            _ => {
                // Drops any orphaned cookie so the edge guard agrees.
                self.clear_store();
                AuthPhase::Unauthenticated
            }
        };
        let snapshot = inner.commit(phase);
        drop(inner);
        self.notify(&snapshot);
    }

    /// Exchange `credentials` for a session and persist it.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's [`AuthError`], [`AuthError::Persistence`]
    /// if the session could not be stored, or [`AuthError::Superseded`] if a
    /// logout, newer login, or teardown happened while waiting.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let epoch = {
            let mut inner = self.lock();
            if inner.closed {
                return Err(AuthError::Superseded);
            }
            inner.epoch += 1;
            inner.epoch
        };

        let result = self.shared.api.login(credentials).await;

        let mut inner = self.lock();
        if inner.closed || inner.epoch != epoch {
            tracing::debug!(epoch, "discarding superseded login result");
            return Err(AuthError::Superseded);
        }

        let outcome = result.and_then(|session| {
            self.shared.store.save(&session)?;
            Ok(session)
        });
        let snapshot = match outcome {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, role = %session.tenant.role, "login succeeded");
                inner.token = Some(session.token);
                inner.commit(AuthPhase::Authenticated { user: session.user, tenant: session.tenant })
            }
            Err(e) => {
                tracing::info!(error = %e, "login failed");
                // A failed save has already emptied both targets.
                let store_cleared = matches!(e, AuthError::Persistence(_));
                if store_cleared {
                    inner.token = None;
                }
                let settle = match inner.phase {
                    AuthPhase::Unauthenticated => false,
                    AuthPhase::Authenticated { .. } => store_cleared,
                    _ => true,
                };
                if settle {
                    let snapshot = inner.commit(AuthPhase::Unauthenticated);
                    drop(inner);
                    self.notify(&snapshot);
                }
                return Err(e);
            }
        };
        drop(inner);
        self.notify(&snapshot);
        Ok(())
    }

    /// Clear the session and become `Unauthenticated` immediately.
    ///
    /// Returns the token that was active so the caller can revoke it
    /// remotely.
    pub fn logout(&self) -> Option<String> {
        tracing::info!("logout");
        self.end_session()
    }

    /// Same transition as [`logout`](Self::logout), triggered by the API
    /// layer rejecting the current session.
    pub fn invalidate(&self, reason: &str) {
        tracing::warn!(reason, "session invalidated");
        let _ = self.end_session();
    }

    /// Feed an HTTP status from an authenticated API call back into the
    /// context. Returns `true` if the session was invalidated.
    pub fn observe_status(&self, status: u16) -> bool {
        if matches!(status, 401 | 403) {
            self.invalidate(&format!("api responded {status}"));
            true
        } else {
            false
        }
    }

    /// Detach the context: pending async work is discarded and listeners are
    /// dropped.
    pub fn close(&self) {
        {
            let mut inner = self.lock();
            inner.closed = true;
            inner.epoch += 1;
        }
        self.listeners().clear();
    }

    fn end_session(&self) -> Option<String> {
        let mut inner = self.lock();
        inner.epoch += 1;
        let token = inner.token.take();
        self.clear_store();
        if inner.closed || inner.phase == AuthPhase::Unauthenticated {
            return token;
        }
        let snapshot = inner.commit(AuthPhase::Unauthenticated);
        drop(inner);
        self.notify(&snapshot);
        token
    }

    fn clear_store(&self) {
        if let Err(e) = self.shared.store.clear() {
            tracing::warn!(error = %e, "failed to clear stored session");
        }
    }

    fn notify(&self, snapshot: &AuthSnapshot) {
        let listeners: Vec<Listener> = self.listeners().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(snapshot);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.shared.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Listener registration; unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    shared: Weak<Shared>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

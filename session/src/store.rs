//! Session persistence across the cookie and durable client storage.
//!
//! ARCHITECTURE
//! ============
//! The cookie carries only the token and is what the edge guard observes.
//! Durable storage carries the full JSON session and is what hydration reads.
//! Both are abstracted behind [`SessionBackend`] so the browser, the CLI and
//! tests plug in their own targets.
//!
//! TRADE-OFFS
//! ==========
//! The cookie is written by the client and therefore cannot be `HttpOnly`;
//! the durable copy is readable by any script on the origin. That exposure is
//! accepted in exchange for letting the edge guard run without a server-side
//! session table.
//!
//! `save` writes the cookie first. A torn write therefore leaves at worst a
//! token without a matching profile, which `load` already treats as absent.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::{Arc, Mutex, PoisonError};

use crate::model::{Session, SessionError};

/// Failure reported by a single storage target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The target does not exist in this environment (SSR, private mode).
    #[error("storage unavailable")]
    Unavailable,
    /// The target refused the operation (quota, security policy).
    #[error("storage rejected operation: {0}")]
    Rejected(String),
    #[error("storage io error: {0}")]
    Io(String),
}

/// Session could not be persisted or cleared.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to write session to {target}: {source}")]
    Write {
        target: &'static str,
        #[source]
        source: StorageError,
    },
    #[error("failed to clear session from {target}: {source}")]
    Remove {
        target: &'static str,
        #[source]
        source: StorageError,
    },
    #[error("failed to encode session: {0}")]
    Encode(#[from] SessionError),
}

/// One storage location holding a single string value.
pub trait SessionBackend: Send + Sync {
    /// Short label used in logs and errors (`"cookie"`, `"local_storage"`).
    fn name(&self) -> &'static str;

    /// Read the stored value, `None` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the target cannot be read.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the target refuses the write.
    fn write(&self, value: &str) -> Result<(), StorageError>;

    /// Remove the stored value. Removing a missing value succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the target refuses the removal.
    fn remove(&self) -> Result<(), StorageError>;
}

/// In-process backend for SSR, tests, and dry runs.
///
/// Clones share the same slot, so a test can keep a handle after moving one
/// into a [`SessionStore`].
#[derive(Clone, Debug)]
pub struct MemoryBackend {
    name: &'static str,
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name, slot: Arc::new(Mutex::new(None)) }
    }

    /// Current value without going through the trait.
    #[must_use]
    pub fn peek(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SessionBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.peek())
    }

    fn write(&self, value: &str) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(value.to_owned());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Reads and writes the session across the cookie and durable targets.
pub struct SessionStore {
    cookie: Box<dyn SessionBackend>,
    durable: Box<dyn SessionBackend>,
}

impl SessionStore {
    #[must_use]
    pub fn new(cookie: impl SessionBackend + 'static, durable: impl SessionBackend + 'static) -> Self {
        Self { cookie: Box::new(cookie), durable: Box::new(durable) }
    }

    /// Store backed by two fresh [`MemoryBackend`]s.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new("cookie"), MemoryBackend::new("durable"))
    }

    /// Load the persisted session, `None` if absent, torn, or malformed.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let cookie_token = match self.cookie.read() {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                tracing::warn!(target_name = self.cookie.name(), error = %e, "session cookie read failed");
                return None;
            }
        };

        let raw = match self.durable.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                if cookie_token.is_some() {
                    tracing::debug!("session cookie present without stored profile");
                }
                return None;
            }
            Err(e) => {
                tracing::warn!(target_name = self.durable.name(), error = %e, "session storage read failed");
                return None;
            }
        };

        let session = match Session::from_json(&raw) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "stored session rejected");
                return None;
            }
        };

        match cookie_token {
            Some(token) if token != session.token => {
                tracing::warn!("session cookie does not match stored session");
                None
            }
            Some(_) => Some(session),
            None => {
                tracing::debug!(target_name = self.durable.name(), "session restored from durable storage");
                Some(session)
            }
        }
    }

    /// Persist `session` to both targets, or to neither.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if encoding or either write fails; both
    /// targets are cleared before returning.
    pub fn save(&self, session: &Session) -> Result<(), PersistenceError> {
        let encoded = session.to_json()?;
        let result = self
            .cookie
            .write(&session.token)
            .map_err(|source| PersistenceError::Write { target: self.cookie.name(), source })
            .and_then(|()| {
                self.durable
                    .write(&encoded)
                    .map_err(|source| PersistenceError::Write { target: self.durable.name(), source })
            });

        if let Err(e) = result {
            tracing::warn!(error = %e, "session save failed, rolling back");
            if let Err(clear_err) = self.clear() {
                tracing::warn!(error = %clear_err, "session rollback incomplete");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove the session from both targets. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the first [`PersistenceError`]; every target is still attempted.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        let cookie = self
            .cookie
            .remove()
            .map_err(|source| PersistenceError::Remove { target: self.cookie.name(), source });
        let durable = self
            .durable
            .remove()
            .map_err(|source| PersistenceError::Remove { target: self.durable.name(), source });
        cookie.and(durable)
    }
}

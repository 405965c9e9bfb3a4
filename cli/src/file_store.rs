//! File-backed session targets for the CLI.
//!
//! DESIGN
//! ======
//! The CLI mirrors the browser layout: one file holds only the token (the
//! cookie's role), one holds the JSON session (the durable copy). Writes go
//! through a temp file and a rename so a crash never leaves a half-written
//! session behind.

#[cfg(test)]
#[path = "file_store_test.rs"]
mod file_store_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use session::{SessionBackend, SessionStore, StorageError};

pub const TOKEN_FILE: &str = "session_token";
pub const SESSION_FILE: &str = "session.json";

#[derive(Clone, Debug)]
pub struct FileBackend {
    name: &'static str,
    path: PathBuf,
}

impl FileBackend {
    #[must_use]
    pub fn new(name: &'static str, path: PathBuf) -> Self {
        Self { name, path }
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> StorageError {
    StorageError::Io(format!("{}: {err}", path.display()))
}

impl SessionBackend for FileBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn read(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw.trim().to_owned()).filter(|s| !s.is_empty())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&self.path, &e)),
        }
    }

    fn write(&self, value: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, &e))?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, value).map_err(|e| io_error(&tmp, &e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, &e))
    }

    fn remove(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path, &e)),
        }
    }
}

/// Session store rooted at `dir`.
#[must_use]
pub fn session_store(dir: &Path) -> SessionStore {
    SessionStore::new(
        FileBackend::new("token_file", dir.join(TOKEN_FILE)),
        FileBackend::new("session_file", dir.join(SESSION_FILE)),
    )
}

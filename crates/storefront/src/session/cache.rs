//! Local session cache.
//!
//! When no remote session is active, the current identity is persisted
//! to on-device storage (the `numa-user` record) so the session survives
//! a restart without network access. The cache holds at most one
//! serialized [`Identity`]; all operations are synchronous.
//!
//! A malformed cached record is logged and treated as absent - it never
//! crashes the reconciler.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use numa_core::Identity;
use thiserror::Error;

/// Errors from session cache writes.
///
/// Reads never fail: unreadable or malformed records degrade to "no
/// cached session".
#[derive(Debug, Error)]
pub enum SessionCacheError {
    /// The cache file could not be written or removed.
    #[error("session cache io error: {0}")]
    Io(#[from] io::Error),

    /// The identity could not be serialized.
    #[error("session cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-device persistence for the current identity.
///
/// Implementations must be cheap to call from the reconciler's state
/// transitions; the file-backed store writes a single small JSON file.
pub trait SessionStore: Send + Sync {
    /// Load the cached identity, if a valid one exists.
    fn load(&self) -> Option<Identity>;

    /// Persist the identity, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save(&self, identity: &Identity) -> Result<(), SessionCacheError>;

    /// Remove the cached record. Removing an absent record is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing record cannot be removed.
    fn clear(&self) -> Result<(), SessionCacheError>;
}

/// File-backed session store.
///
/// The record lives at a configurable path (default
/// `.numa/numa-user.json`); parent directories are created on first
/// save.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Identity> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session cache unreadable");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(identity) => Some(identity),
            Err(e) => {
                // Malformed record: treat as absent rather than failing
                tracing::warn!(path = %self.path.display(), error = %e, "session cache malformed, ignoring");
                None
            }
        }
    }

    fn save(&self, identity: &Identity) -> Result<(), SessionCacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(identity)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionCacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory session store, for tests and embedded use.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Identity>>,
}

impl MemorySessionStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a cached identity.
    #[must_use]
    pub fn with_identity(identity: Identity) -> Self {
        Self {
            slot: Mutex::new(Some(identity)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Identity>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Identity> {
        self.lock().clone()
    }

    fn save(&self, identity: &Identity) -> Result<(), SessionCacheError> {
        *self.lock() = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionCacheError> {
        *self.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use numa_core::Email;

    fn ayse() -> Identity {
        Identity::new("1", "Ayşe", Email::parse("ayse@x.com").unwrap())
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("numa-user.json"));

        assert_eq!(store.load(), None);

        store.save(&ayse()).unwrap();
        assert_eq!(store.load(), Some(ayse()));

        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested/dir/numa-user.json"));

        store.save(&ayse()).unwrap();
        assert_eq!(store.load(), Some(ayse()));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("numa-user.json"));

        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn test_malformed_record_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numa-user.json");
        std::fs::write(&path, "{not valid json").unwrap();

        let store = FileSessionStore::new(path);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load(), None);

        store.save(&ayse()).unwrap();
        assert_eq!(store.load(), Some(ayse()));

        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }
}

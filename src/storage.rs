//! Named key-value slots for persisted panel state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The history store only needs "read a slot" and "replace a slot". Each
//! backend treats a single `set` as the atomic write unit, so a reader never
//! observes a half-written value.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Errors produced while writing a slot.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing file could not be written or moved into place.
    #[error("slot {key} write failed: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The value could not be serialized for the slot.
    #[error("slot {key} encode failed: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The host storage refused the write (quota, privacy mode).
    #[error("slot {key} write rejected: {reason}")]
    Rejected { key: String, reason: String },
}

/// A store of string values addressed by slot name.
pub trait KeyValueStore {
    /// Read the raw value of `key`, or `None` if the slot is empty or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value of `key` in one write.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend could not persist the value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-local slots. Used by tests and by embedders without persistence.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// One JSON file per slot inside a profile directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so an
/// interrupted process leaves either the old value or the new one.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.slot_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io { key: key.to_owned(), source };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let target = self.slot_path(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&staging, value).map_err(io_err)?;
        std::fs::rename(&staging, &target).map_err(io_err)
    }
}

// =============================================================================
// LOCAL STORAGE
// =============================================================================

/// The browsing profile's `localStorage`. `setItem` replaces a value whole.
#[cfg(feature = "browser")]
#[derive(Debug, Clone)]
pub struct LocalStorage {
    inner: web_sys::Storage,
}

#[cfg(feature = "browser")]
impl LocalStorage {
    /// Open the window's `localStorage`, if the page is allowed to use it.
    #[must_use]
    pub fn open() -> Option<Self> {
        let inner = web_sys::window()?.local_storage().ok().flatten()?;
        Some(Self { inner })
    }
}

#[cfg(feature = "browser")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .set_item(key, value)
            .map_err(|e| StorageError::Rejected { key: key.to_owned(), reason: format!("{e:?}") })
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;

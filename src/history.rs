//! History store: bounded record of past query/response pairs.
//!
//! DESIGN
//! ======
//! The whole sequence lives in one slot, newest first. Appends read the
//! current sequence, prepend, truncate to [`HISTORY_CAPACITY`] and write the
//! result back in a single `set`. Entries are never edited in place.
//!
//! The slot key carries a schema version. Anything stored under it that does
//! not decode as the current schema is discarded rather than migrated.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Maximum number of retained entries.
pub const HISTORY_CAPACITY: usize = 5;

/// Slot holding the serialized sequence. Bump the suffix on schema changes.
pub const HISTORY_KEY: &str = "answer_panel_history_v1";

/// One answered query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub response: String,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
}

/// Reads and appends the persisted history sequence.
pub struct HistoryStore<S> {
    storage: S,
    clock: fn() -> i64,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage, clock: now_millis }
    }

    /// Replace the timestamp source. Tests use this for stable entries.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Load the stored sequence, newest first.
    ///
    /// An absent or undecodable slot yields an empty sequence.
    pub fn load(&self) -> Vec<HistoryEntry> {
        let Some(raw) = self.storage.get(HISTORY_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(mut entries) => {
                entries.truncate(HISTORY_CAPACITY);
                entries
            }
            Err(e) => {
                warn!(error = %e, "discarding unreadable history");
                Vec::new()
            }
        }
    }

    /// Record a new pair at the front and persist the truncated sequence.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the sequence could not be written. The
    /// previously stored sequence is left untouched in that case.
    pub fn append(&self, query: &str, response: &str) -> Result<(), StorageError> {
        let mut entries = self.load();
        entries.insert(
            0,
            HistoryEntry { query: query.to_owned(), response: response.to_owned(), timestamp: (self.clock)() },
        );
        entries.truncate(HISTORY_CAPACITY);

        let raw = serde_json::to_string(&entries)
            .map_err(|source| StorageError::Encode { key: HISTORY_KEY.to_owned(), source })?;
        self.storage.set(HISTORY_KEY, &raw)?;
        debug!(len = entries.len(), "history updated");
        Ok(())
    }
}

#[cfg(feature = "browser")]
#[allow(clippy::cast_possible_truncation)]
fn now_millis() -> i64 {
    js_sys::Date::now() as i64
}

#[cfg(not(feature = "browser"))]
fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

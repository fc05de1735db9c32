//! Persistence adapter: mirrors the registry and the z-order id list into a
//! session-scoped key/value store.
//!
//! The store itself is a collaborator behind [`SessionStore`]. In the browser
//! it is `window.sessionStorage` (see `web`); in tests and in the CLI it is a
//! [`MemoryStore`]. Reads never fail: an absent or corrupt value is logged and
//! treated as "no prior state". Writes return [`StorageError`] so the host
//! can report a failed save.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::consts::{IDS_KEY, LEGACY_KEY, SHAPES_KEY};
use crate::error::StorageError;
use crate::id::ShapeId;
use crate::registry::ShapeSnapshot;

/// String key/value store with `sessionStorage` semantics.
pub trait SessionStore {
    /// Read the value for `key`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the backing store cannot be reached.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `WriteRejected` if the backing store refuses the write.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `WriteRejected` if the backing store refuses the delete.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process store. Serializable so a host can spill it to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
    #[serde(skip)]
    read_only: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write, as a full quota would.
    #[must_use]
    pub fn read_only() -> Self {
        Self { items: BTreeMap::new(), read_only: true }
    }

    #[must_use]
    pub fn items(&self) -> &BTreeMap<String, String> {
        &self.items
    }

    fn check_writable(&self, key: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::WriteRejected { key: key.to_owned(), reason: "store is read-only".into() });
        }
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable(key)?;
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_writable(key)?;
        self.items.remove(key);
        Ok(())
    }
}

/// Keys the board state is persisted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Kind → records mapping.
    pub shapes: String,
    /// Z-ordered id list.
    pub ids: String,
    /// Single key written by earlier revisions; read-only fallback.
    pub legacy: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self { shapes: SHAPES_KEY.to_owned(), ids: IDS_KEY.to_owned(), legacy: LEGACY_KEY.to_owned() }
    }
}

/// Reads and writes board state through a [`SessionStore`].
#[derive(Debug, Clone, Default)]
pub struct BoardPersistence {
    keys: StorageKeys,
}

impl BoardPersistence {
    #[must_use]
    pub fn new(keys: StorageKeys) -> Self {
        Self { keys }
    }

    #[must_use]
    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Load the kind → records mapping, falling back to the legacy key when
    /// the split key is absent. Absent or corrupt state yields an empty
    /// snapshot.
    pub fn load_shapes<S: SessionStore + ?Sized>(&self, store: &S) -> ShapeSnapshot {
        if let Some(snapshot) = read_json(store, &self.keys.shapes) {
            return snapshot;
        }
        if let Some(snapshot) = read_json(store, &self.keys.legacy) {
            tracing::info!(key = %self.keys.legacy, "restored shapes from legacy key");
            return snapshot;
        }
        ShapeSnapshot::default()
    }

    /// Persist the kind → records mapping.
    ///
    /// # Errors
    ///
    /// Returns `Encode` if serialization fails or the store's write error.
    pub fn save_shapes<S: SessionStore + ?Sized>(
        &self,
        store: &mut S,
        snapshot: &ShapeSnapshot,
    ) -> Result<(), StorageError> {
        write_json(store, &self.keys.shapes, snapshot)?;
        tracing::debug!(key = %self.keys.shapes, count = snapshot.len(), "shapes saved");
        Ok(())
    }

    /// Load the persisted z-order. Absent or corrupt state yields no ids.
    pub fn load_ids<S: SessionStore + ?Sized>(&self, store: &S) -> Vec<ShapeId> {
        read_json(store, &self.keys.ids).unwrap_or_default()
    }

    /// Persist the z-order id list.
    ///
    /// # Errors
    ///
    /// Returns `Encode` if serialization fails or the store's write error.
    pub fn save_ids<S: SessionStore + ?Sized>(&self, store: &mut S, ids: &[ShapeId]) -> Result<(), StorageError> {
        write_json(store, &self.keys.ids, ids)?;
        tracing::debug!(key = %self.keys.ids, count = ids.len(), "z-order saved");
        Ok(())
    }

    /// Delete every key this adapter owns, the legacy key included.
    ///
    /// # Errors
    ///
    /// Returns the store's write error.
    pub fn clear<S: SessionStore + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        store.remove_item(&self.keys.shapes)?;
        store.remove_item(&self.keys.ids)?;
        store.remove_item(&self.keys.legacy)?;
        Ok(())
    }
}

fn read_json<S: SessionStore + ?Sized, T: DeserializeOwned>(store: &S, key: &str) -> Option<T> {
    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(%key, error = %e, "session storage read failed");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(%key, error = %e, "discarding corrupt persisted state");
            None
        }
    }
}

fn write_json<S: SessionStore + ?Sized, T: Serialize + ?Sized>(
    store: &mut S,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode { key: key.to_owned(), source })?;
    store.set_item(key, &raw)
}

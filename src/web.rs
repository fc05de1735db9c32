//! Browser glue: `window.sessionStorage` as a [`SessionStore`].
//!
//! Compiled for `wasm32` only. The host builds its scene-graph binding and
//! hands both to [`crate::engine::EngineCore::new`].

use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::error::StorageError;
use crate::storage::SessionStore;

/// Tab-scoped storage; cleared when the tab closes.
#[derive(Debug, Clone)]
pub struct BrowserSessionStore {
    storage: Storage,
}

impl BrowserSessionStore {
    /// Open the current window's session storage.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` outside a window or when storage is disabled.
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable)?;
        match window.session_storage() {
            Ok(Some(storage)) => Ok(Self { storage }),
            Ok(None) => Err(StorageError::Unavailable),
            Err(e) => {
                tracing::warn!(error = %reason(&e), "session storage refused");
                Err(StorageError::Unavailable)
            }
        }
    }
}

impl SessionStore for BrowserSessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(|e| {
            tracing::warn!(%key, error = %reason(&e), "session storage read failed");
            StorageError::Unavailable
        })
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::WriteRejected { key: key.to_owned(), reason: reason(&e) })
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::WriteRejected { key: key.to_owned(), reason: reason(&e) })
    }
}

// Quota errors arrive as DOMException objects, not strings.
fn reason(e: &JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

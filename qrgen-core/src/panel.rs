//! Persisted history panel layout.

use std::sync::Arc;

use crate::error::{StorageError, StorageResult};
use crate::storage::{KeyValueStore, HISTORY_COLLAPSED_KEY};

/// Whether the history panel is collapsed, stored as a JSON boolean.
#[derive(Debug)]
pub struct PanelPreferences {
    store: Arc<dyn KeyValueStore>,
    collapsed: bool,
}

impl PanelPreferences {
    /// Read the stored flag. Absent or unreadable values mean expanded.
    #[must_use]
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let collapsed = match store.get(HISTORY_COLLAPSED_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<bool>(&raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored panel state {raw:?}: {e}");
                false
            }),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Failed to read panel state: {e}");
                false
            }
        };
        Self { store, collapsed }
    }

    /// Whether the panel is collapsed.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Flip and persist the flag, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag could not be stored. The in-memory value
    /// is flipped regardless.
    pub fn toggle_collapsed(&mut self) -> StorageResult<bool> {
        self.collapsed = !self.collapsed;
        let json = serde_json::to_string(&self.collapsed)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(HISTORY_COLLAPSED_KEY, &json)?;
        Ok(self.collapsed)
    }
}

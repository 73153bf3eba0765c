//! Deduplicating history of saved configurations.
//!
//! The list is ordered newest first and never holds two entries with the
//! same text and colors. Every mutation rewrites the full list under
//! [`HISTORY_KEY`]; a failed write is reported but does not undo the
//! in-memory change.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::QrConfig;
use crate::error::{HistoryError, HistoryResult, StorageError};
use crate::sample::sample_entries;
use crate::storage::{KeyValueStore, HISTORY_KEY};

/// Unique identifier for a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Create a new unique entry ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A saved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Stable identifier, assigned once at creation.
    pub id: EntryId,
    /// The saved text and colors.
    #[serde(flatten)]
    pub config: QrConfig,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
}

impl HistoryEntry {
    /// Create an entry stamped with a fresh ID and the current time.
    #[must_use]
    pub fn new(config: QrConfig) -> Self {
        Self {
            id: EntryId::new(),
            config,
            created_at: crate::current_timestamp_ms(),
        }
    }
}

/// What [`HistoryStore::add`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new entry was inserted at the front.
    Added(EntryId),
    /// An entry with the same text and colors already exists.
    DuplicateIgnored,
    /// The text was empty or whitespace-only.
    EmptyIgnored,
}

/// Ordered, deduplicated history backed by a [`KeyValueStore`].
#[derive(Debug)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<HistoryEntry>,
    // In-memory list not yet written; reused by `load` instead of reseeding.
    unpersisted: bool,
}

impl HistoryStore {
    /// Create an empty, unloaded store. Call [`HistoryStore::load`] next.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            entries: Vec::new(),
            unpersisted: false,
        }
    }

    /// Read the persisted list, seeding the demonstration set if none exists.
    ///
    /// A persisted value that does not parse is treated as absent. Calling
    /// this twice without a mutation in between yields the same list.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::PersistenceRead`] if the store cannot be read
    /// (the in-memory list is left unchanged), or
    /// [`HistoryError::PersistenceWrite`] if the seed could not be persisted
    /// (the seed is still loaded in memory).
    pub fn load(&mut self) -> HistoryResult<&[HistoryEntry]> {
        let persisted = self
            .store
            .get(HISTORY_KEY)
            .map_err(HistoryError::PersistenceRead)?;

        let parsed = persisted.and_then(|json| {
            serde_json::from_str::<Vec<HistoryEntry>>(&json)
                .map_err(|e| tracing::warn!("Discarding unreadable history: {e}"))
                .ok()
        });

        match parsed {
            Some(entries) => {
                tracing::debug!("Loaded {} history entries", entries.len());
                self.entries = entries;
            }
            None if self.unpersisted => {
                tracing::debug!("Keeping {} unpersisted history entries", self.entries.len());
            }
            None => {
                self.entries = sample_entries(crate::current_timestamp_ms());
                self.unpersisted = true;
                tracing::info!("Seeded history with {} sample entries", self.entries.len());
                self.persist()?;
            }
        }
        Ok(&self.entries)
    }

    /// Save a configuration at the front of the list.
    ///
    /// No-op for empty or whitespace-only text, and for a configuration whose
    /// text and both colors match an existing entry anywhere in the list.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::PersistenceWrite`] if the new list could not be
    /// persisted. The entry has already been inserted in memory.
    pub fn add(&mut self, config: &QrConfig) -> HistoryResult<AddOutcome> {
        if !config.has_renderable_text() {
            return Ok(AddOutcome::EmptyIgnored);
        }
        if self.entries.iter().any(|e| e.config.same_design(config)) {
            tracing::debug!("Ignoring duplicate history entry");
            return Ok(AddOutcome::DuplicateIgnored);
        }

        let entry = HistoryEntry::new(config.clone());
        let id = entry.id;
        self.entries.insert(0, entry);
        tracing::debug!("Added history entry {id}");

        self.persist()?;
        Ok(AddOutcome::Added(id))
    }

    /// Empty the list and delete the persisted key.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::PersistenceWrite`] if the key could not be
    /// deleted. The in-memory list is already empty.
    pub fn clear(&mut self) -> HistoryResult<()> {
        self.entries.clear();
        self.unpersisted = false;
        self.store
            .remove(HISTORY_KEY)
            .map_err(HistoryError::PersistenceWrite)?;
        tracing::info!("Cleared history");
        Ok(())
    }

    /// Entries whose text contains `query`, ignoring case, in list order.
    ///
    /// A blank query returns every entry.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&HistoryEntry> {
        if query.trim().is_empty() {
            return self.entries.iter().collect();
        }
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.config.text.to_lowercase().contains(&needle))
            .collect()
    }

    /// Look up an entry by ID.
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All entries, newest first.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&mut self) -> HistoryResult<()> {
        let json = serde_json::to_string(&self.entries).map_err(|e| {
            HistoryError::PersistenceWrite(StorageError::Serialization(e.to_string()))
        })?;
        self.store
            .set(HISTORY_KEY, &json)
            .map_err(HistoryError::PersistenceWrite)?;
        self.unpersisted = false;
        Ok(())
    }
}

//! Durable key-value storage.
//!
//! [`KeyValueStore`] is the synchronous, string-keyed, fixed-capacity store
//! that history, theme, and panel state are persisted through. It assumes a
//! single writer; two processes sharing one data directory may race.
//!
//! - [`MemoryStore`] keeps values in memory only (tests, ephemeral sessions).
//! - [`FileStore`] keeps the whole key space as one JSON object on disk.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{StorageError, StorageResult};

/// Key holding the JSON array of history entries.
pub const HISTORY_KEY: &str = "qr-history";

/// Key holding the history panel's collapsed flag (JSON boolean).
pub const HISTORY_COLLAPSED_KEY: &str = "history-collapsed";

/// Key holding the theme preference literal.
pub const THEME_KEY: &str = "theme";

/// Default capacity in bytes (keys plus values).
pub const DEFAULT_CAPACITY: usize = 5 * 1024 * 1024;

/// File name used by [`FileStore`] inside its data directory.
pub const STORAGE_FILE: &str = "storage.json";

/// Synchronous, string-keyed storage with a fixed capacity.
pub trait KeyValueStore: Send + Sync + Debug {
    /// Read a value. Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::QuotaExceeded`] if the write would exceed the
    /// capacity, or an I/O error if the backing medium rejects it. A failed
    /// write leaves the previous value in place.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a key. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium rejects the write.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Check whether a key is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Bytes used by `entries` once `key` holds `value`.
fn usage_after(entries: &BTreeMap<String, String>, key: &str, value: &str) -> usize {
    entries
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| k.len() + v.len())
        .sum::<usize>()
        + key.len()
        + value.len()
}

fn check_quota(
    entries: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    capacity: usize,
) -> StorageResult<()> {
    let required = usage_after(entries, key, value);
    if required > capacity {
        return Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            required,
            capacity,
        });
    }
    Ok(())
}

/// In-memory store. Nothing survives the process.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
    capacity: usize,
}

impl MemoryStore {
    /// Create an empty store with [`DEFAULT_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty store holding at most `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            capacity,
        }
    }

    /// Bytes currently used by keys and values.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        check_quota(&entries, key, value, self.capacity)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store.
///
/// All keys live in a single JSON object at `<data_dir>/storage.json`. Every
/// write rewrites that file through a temporary sibling and a rename, so a
/// crash mid-write leaves the previous contents intact. The in-memory copy is
/// only updated once the file write has succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
    capacity: usize,
    quarantined: Option<PathBuf>,
}

impl FileStore {
    /// Open (or create) a store in `data_dir` with [`DEFAULT_CAPACITY`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or an existing
    /// storage file cannot be read.
    pub fn open(data_dir: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_capacity(data_dir, DEFAULT_CAPACITY)
    }

    /// Open (or create) a store in `data_dir` holding at most `capacity` bytes.
    ///
    /// A storage file that does not parse is renamed to
    /// `storage.json.corrupt` and the store starts empty; see
    /// [`FileStore::quarantined`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, an existing
    /// storage file cannot be read, or a corrupt one cannot be moved aside.
    pub fn open_with_capacity(data_dir: impl AsRef<Path>, capacity: usize) -> StorageResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(STORAGE_FILE);

        let mut quarantined = None;
        let entries = if path.exists() {
            let contents = std::fs::read(&path)?;
            match serde_json::from_slice::<BTreeMap<String, String>>(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    let aside = path.with_extension("json.corrupt");
                    tracing::warn!(
                        "Unreadable storage file {} ({e}); moving it to {}",
                        path.display(),
                        aside.display()
                    );
                    std::fs::rename(&path, &aside)?;
                    quarantined = Some(aside);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!("Opened key-value store at {}", path.display());
        Ok(Self {
            path,
            entries: RwLock::new(entries),
            capacity,
            quarantined,
        })
    }

    /// Where an unreadable storage file was moved when this store was opened.
    #[must_use]
    pub fn quarantined(&self) -> Option<&Path> {
        self.quarantined.as_deref()
    }

    /// Path of the backing JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        check_quota(&entries, key, value, self.capacity)?;

        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

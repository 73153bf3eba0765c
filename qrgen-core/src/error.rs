//! Error types for core state operations.

use thiserror::Error;

/// Result type for key-value storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Result type for theme operations.
pub type ThemeResult<T> = Result<T, ThemeError>;

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would push the store past its fixed capacity.
    #[error("Storage quota exceeded writing {key}: {required} bytes needed, capacity is {capacity}")]
    QuotaExceeded {
        /// Key being written.
        key: String,
        /// Total bytes the store would hold after the write.
        required: usize,
        /// Configured capacity in bytes.
        capacity: usize,
    },

    /// An I/O error occurred reading or writing the backing file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized or the backing file could not be parsed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised by the [`HistoryStore`](crate::history::HistoryStore).
///
/// Neither variant leaves the in-memory list in an inconsistent state. A
/// `PersistenceWrite` is returned *after* the mutation has been applied in
/// memory; the list stays authoritative for the session.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Reading the persisted history failed.
    #[error("Failed to read history: {0}")]
    PersistenceRead(#[source] StorageError),

    /// The durable store rejected a write (e.g. quota exhausted).
    #[error("Failed to persist history: {0}")]
    PersistenceWrite(#[source] StorageError),
}

/// Errors raised by the [`ThemeResolver`](crate::theme::ThemeResolver).
#[derive(Debug, Error)]
pub enum ThemeError {
    /// A preference string was not one of `light`, `dark`, `system`.
    #[error("Unknown theme preference: {0}")]
    UnknownPreference(String),

    /// The preference was applied but could not be persisted.
    #[error("Failed to persist theme preference: {0}")]
    Persistence(#[from] StorageError),

    /// Subscribing to the environment signal requires a Tokio runtime.
    #[error("No async runtime available for signal subscription")]
    NoRuntime,
}

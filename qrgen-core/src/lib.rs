//! # qrgen Core
//!
//! Application state for the qrgen QR code generator. Everything here runs
//! without a rendering surface: the encoder and rasterizer live in
//! `qrgen-renderer`, and the controller that wires them together lives in
//! `qrgen-app`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 qrgen-core                  │
//! ├──────────────────────┬──────────────────────┤
//! │  QrConfigState       │  NotificationQueue   │
//! │  - text + colors     │  - timed expiry      │
//! ├──────────────────────┼──────────────────────┤
//! │  HistoryStore        │  ThemeResolver       │
//! │  - dedup, newest 1st │  - light/dark/system │
//! ├──────────────────────┴──────────────────────┤
//! │        KeyValueStore (memory / file)        │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod history;
pub mod notification;
pub mod panel;
pub mod sample;
pub mod storage;
pub mod theme;

use std::time::{SystemTime, UNIX_EPOCH};

pub use config::{ColorChannel, ColorHex, QrConfig, QrConfigState};
pub use error::{HistoryError, HistoryResult, StorageError, StorageResult, ThemeError, ThemeResult};
pub use history::{AddOutcome, EntryId, HistoryEntry, HistoryStore};
pub use notification::{Notification, NotificationId, NotificationKind, NotificationQueue};
pub use panel::PanelPreferences;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use theme::{ResolvedTheme, SignalSubscription, ThemePreference, ThemeResolver, ThemeSignal};

/// qrgen core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the current Unix timestamp in milliseconds.
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

//! Demonstration entries seeded into an empty history.

use crate::config::QrConfig;
use crate::history::{EntryId, HistoryEntry};

const DAY_MS: u64 = 86_400_000;

const SAMPLES: [(&str, &str, &str); 5] = [
    ("https://github.com", "#000000", "#ffffff"),
    ("Welcome to QR Code Generator!", "#3b82f6", "#ffffff"),
    ("mailto:contact@example.com", "#22c55e", "#f0fdf4"),
    ("tel:+1234567890", "#ef4444", "#ffffff"),
    ("WIFI:T:WPA;S:MyNetwork;P:password123;H:false;;", "#8b5cf6", "#faf5ff"),
];

/// Build the seed set, newest first, dated one to five days before `now_ms`.
#[must_use]
pub fn sample_entries(now_ms: u64) -> Vec<HistoryEntry> {
    (1u64..)
        .zip(SAMPLES)
        .map(|(days_ago, (text, fg, bg))| HistoryEntry {
            id: EntryId::new(),
            config: QrConfig::new(text, fg, bg),
            created_at: now_ms.saturating_sub(days_ago * DAY_MS),
        })
        .collect()
}

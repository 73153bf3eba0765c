//! Integration tests for the history lifecycle over both store backends.
//!
//! Walks the seed → add → duplicate → clear sequence and checks the
//! persisted key at each step, then repeats it across store reopen
//! (simulating an application restart).

use std::sync::Arc;

use qrgen_core::storage::HISTORY_KEY;
use qrgen_core::{
    AddOutcome, FileStore, HistoryStore, KeyValueStore, MemoryStore, QrConfig,
};

fn hello() -> QrConfig {
    QrConfig::new("hello", "#000000", "#ffffff")
}

fn run_scenario(kv: Arc<dyn KeyValueStore>) {
    assert!(!kv.contains(HISTORY_KEY).expect("contains"));

    let mut history = HistoryStore::new(kv.clone());
    assert_eq!(history.load().expect("load").len(), 5);

    assert!(matches!(history.add(&hello()).expect("add"), AddOutcome::Added(_)));
    assert_eq!(history.len(), 6);
    assert_eq!(history.entries()[0].config.text, "hello");

    assert_eq!(
        history.add(&hello()).expect("add duplicate"),
        AddOutcome::DuplicateIgnored
    );
    assert_eq!(history.len(), 6);

    history.clear().expect("clear");
    assert!(history.is_empty());
    assert!(!kv.contains(HISTORY_KEY).expect("contains"));
}

#[test]
fn test_scenario_memory_store() {
    run_scenario(Arc::new(MemoryStore::new()));
}

#[test]
fn test_scenario_file_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    run_scenario(Arc::new(FileStore::open(dir.path()).expect("open")));
}

#[test]
fn test_history_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");

    // Phase 1: seed and add
    let saved = {
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).expect("open"));
        let mut history = HistoryStore::new(kv);
        history.load().expect("load");
        history.add(&hello()).expect("add");
        history
            .add(&QrConfig::new("hello", "#ff0000", "#ffffff"))
            .expect("add recolored");
        history.entries().to_vec()
    };
    assert_eq!(saved.len(), 7);

    // Phase 2: reopen and compare
    let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).expect("reopen"));
    let mut history = HistoryStore::new(kv);
    assert_eq!(history.load().expect("load"), saved.as_slice());

    // Dedup still holds against reloaded entries
    assert_eq!(
        history.add(&hello()).expect("add"),
        AddOutcome::DuplicateIgnored
    );
}

#[test]
fn test_cleared_history_reseeds_after_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).expect("open"));
        let mut history = HistoryStore::new(kv);
        history.load().expect("load");
        history.clear().expect("clear");
    }

    let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).expect("reopen"));
    let mut history = HistoryStore::new(kv);
    let texts: Vec<_> = history
        .load()
        .expect("load")
        .iter()
        .map(|e| e.config.text.clone())
        .collect();
    assert_eq!(texts.len(), 5);
    assert_eq!(texts[0], "https://github.com");
}

#[test]
fn test_no_duplicates_after_many_adds() {
    let mut history = HistoryStore::new(Arc::new(MemoryStore::new()));
    history.load().expect("load");

    let texts = ["a", "b", "a", "c", "b", "a"];
    let colors = ["#000000", "#111111"];
    for text in texts {
        for color in colors {
            history
                .add(&QrConfig::new(text, color, "#ffffff"))
                .expect("add");
        }
    }

    let entries = history.entries();
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            assert!(!a.config.same_design(&b.config), "duplicate {a:?}");
        }
    }
    // 3 texts x 2 colors on top of the 5 seeds
    assert_eq!(entries.len(), 11);
}

use super::*;
use crate::storage::MemoryStorage;

fn fixed_clock() -> i64 {
    1_700_000_000_000
}

#[test]
fn load_empty_slot_is_empty() {
    let storage = MemoryStorage::new();
    let store = HistoryStore::new(&storage);
    assert!(store.load().is_empty());
}

#[test]
fn load_corrupt_slot_is_empty() {
    let storage = MemoryStorage::new();
    storage.set(HISTORY_KEY, "{not json").unwrap();
    assert!(HistoryStore::new(&storage).load().is_empty());
}

#[test]
fn load_discards_value_of_a_different_shape() {
    let storage = MemoryStorage::new();
    storage.set(HISTORY_KEY, r#"[{"q":"old","a":"schema"}]"#).unwrap();
    assert!(HistoryStore::new(&storage).load().is_empty());
}

#[test]
fn append_prepends_with_timestamp() {
    let storage = MemoryStorage::new();
    let store = HistoryStore::new(&storage).with_clock(fixed_clock);
    store.append("first", "one").unwrap();
    store.append("second", "two").unwrap();

    let entries = store.load();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].query, "second");
    assert_eq!(entries[1].query, "first");
    assert_eq!(entries[0].timestamp, fixed_clock());
}

#[test]
fn append_beyond_capacity_keeps_most_recent_newest_first() {
    let storage = MemoryStorage::new();
    let store = HistoryStore::new(&storage);
    let total = HISTORY_CAPACITY + 3;
    for i in 0..total {
        store.append(&format!("q{i}"), &format!("r{i}")).unwrap();
    }

    let entries = store.load();
    assert_eq!(entries.len(), HISTORY_CAPACITY);
    let queries: Vec<&str> = entries.iter().map(|e| e.query.as_str()).collect();
    let expected: Vec<String> = (0..total).rev().take(HISTORY_CAPACITY).map(|i| format!("q{i}")).collect();
    assert_eq!(queries, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn load_truncates_oversized_stored_sequence() {
    let storage = MemoryStorage::new();
    let oversized: Vec<HistoryEntry> = (0..HISTORY_CAPACITY + 2)
        .map(|i| HistoryEntry { query: format!("q{i}"), response: "r".into(), timestamp: 0 })
        .collect();
    storage.set(HISTORY_KEY, &serde_json::to_string(&oversized).unwrap()).unwrap();

    let entries = HistoryStore::new(&storage).load();
    assert_eq!(entries.len(), HISTORY_CAPACITY);
    assert_eq!(entries[0].query, "q0");
}

#[test]
fn append_writes_whole_sequence_as_one_json_array() {
    let storage = MemoryStorage::new();
    let store = HistoryStore::new(&storage).with_clock(fixed_clock);
    store.append("speed of light", "299,792,458 m/s").unwrap();

    let raw = storage.get(HISTORY_KEY).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        serde_json::json!([
            { "query": "speed of light", "response": "299,792,458 m/s", "timestamp": 1_700_000_000_000_i64 }
        ])
    );
}

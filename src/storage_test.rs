use super::*;

#[test]
fn memory_storage_round_trips_a_slot() {
    let store = MemoryStorage::new();
    assert_eq!(store.get("k"), None);
    store.set("k", "v1").unwrap();
    store.set("k", "v2").unwrap();
    assert_eq!(store.get("k").as_deref(), Some("v2"));
}

#[test]
fn borrowed_store_delegates() {
    let store = MemoryStorage::new();
    let by_ref: &MemoryStorage = &store;
    by_ref.set("k", "shared").unwrap();
    assert_eq!(store.get("k").as_deref(), Some("shared"));
}

#[test]
fn file_storage_missing_slot_reads_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::new(dir.path());
    assert_eq!(store.get("absent"), None);
}

#[test]
fn file_storage_replaces_slot_without_leaving_staging_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::new(dir.path().join("profile"));
    store.set("history", "[1]").unwrap();
    store.set("history", "[1,2]").unwrap();

    assert_eq!(store.get("history").as_deref(), Some("[1,2]"));
    let names: Vec<String> = std::fs::read_dir(store.dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["history.json".to_owned()]);
}

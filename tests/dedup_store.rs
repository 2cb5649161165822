// tests/dedup_store.rs
use reddit_top_relay::{DedupSet, DedupStore};

#[tokio::test]
async fn persist_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    // Parent directories are created on demand.
    let store = DedupStore::new(dir.path().join("nested/state/sent.json"));

    let mut set: DedupSet = ["t3_zeta", "abc", "17xyz"].into_iter().collect();
    set.insert("new-one");
    store.persist(&set).await.expect("persist ok");

    let loaded = store.load().await;
    let mut want: Vec<_> = set.iter().collect();
    let mut got: Vec<_> = loaded.iter().collect();
    want.sort_unstable();
    got.sort_unstable();
    assert_eq!(got, want);
    assert!(!loaded.is_changed());
}

#[tokio::test]
async fn file_is_a_flat_sorted_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sent.json");
    let store = DedupStore::new(&path);

    let set: DedupSet = ["b", "a", "c"].into_iter().collect();
    store.persist(&set).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let ids: Vec<String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(!dir.path().join("sent.json.tmp").exists());
}

#[tokio::test]
async fn commit_writes_only_after_a_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sent.json");
    std::fs::write(&path, r#"["a"]"#).unwrap();
    let store = DedupStore::new(&path);

    let mut set = store.load().await;
    std::fs::write(&path, r#"["sentinel"]"#).unwrap();
    store.commit(&set).await;
    // Unchanged set: file left as-is.
    assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"["sentinel"]"#);

    set.insert("b");
    store.commit(&set).await;
    let ids: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn persist_failure_is_reported_not_panicked() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the parent directory should be.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x").unwrap();
    let store = DedupStore::new(blocker.join("sent.json"));

    let mut set = DedupSet::default();
    set.insert("a");
    assert!(store.persist(&set).await.is_err());
    // commit swallows the same failure.
    store.commit(&set).await;
}

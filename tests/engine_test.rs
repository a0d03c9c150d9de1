//! Black-box `Engine` scenarios exercised only through the public API,
//! mirroring the reference implementation's `storage_test.go` table of
//! cases and spec.md §8's end-to-end scenarios.

use tagkv::{Engine, EngineConfig, Error};
use tempfile::tempdir;

fn open(path: &std::path::Path) -> Engine {
    Engine::open_with_config(
        path,
        EngineConfig {
            background_task_interval_ms: 0,
            ..EngineConfig::default()
        },
    )
    .unwrap()
}

#[test]
fn basic_round_trip_returns_every_set_key() {
    let dir = tempdir().unwrap();
    let engine = open(dir.path());

    engine.set("key1", "value1").unwrap();
    engine.set("key2", "value2").unwrap();

    let mut records = engine.list(&[]).unwrap();
    records.sort_by(|a, b| a.key.cmp(&b.key));

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].key, "key1");
    assert_eq!(records[0].value, "value1");
    assert!(records[0].tags.is_empty());
    assert_eq!(records[1].key, "key2");
    assert_eq!(records[1].value, "value2");
}

#[test]
fn list_with_tag_filter_returns_only_tagged_items() {
    let dir = tempdir().unwrap();
    let engine = open(dir.path());

    engine.set("a", "1").unwrap();
    engine.set("b", "2").unwrap();
    engine.set("c", "1").unwrap();
    engine.tag("a", "find").unwrap();
    engine.tag("b", "find").unwrap();

    let mut found: Vec<String> = engine
        .list(&["find".to_string()])
        .unwrap()
        .into_iter()
        .map(|r| r.key)
        .collect();
    found.sort();
    assert_eq!(found, vec!["a".to_string(), "b".to_string()]);

    assert!(engine.list(&["nope".to_string()]).unwrap().is_empty());
}

#[test]
fn untag_both_keys_removes_them_from_the_listing() {
    let dir = tempdir().unwrap();
    let engine = open(dir.path());

    engine.set("a", "1").unwrap();
    engine.set("b", "2").unwrap();
    engine.tag("a", "find").unwrap();
    engine.tag("b", "find").unwrap();

    engine.untag("a", "find").unwrap();
    engine.untag("b", "find").unwrap();

    assert!(engine.list(&["find".to_string()]).unwrap().is_empty());
}

#[test]
fn delete_removes_item_and_its_tags() {
    let dir = tempdir().unwrap();
    let engine = open(dir.path());

    engine.set("k", "v").unwrap();
    engine.tag("k", "x").unwrap();
    engine.tag("k", "y").unwrap();

    engine.delete("k").unwrap();

    assert!(engine.list(&[]).unwrap().is_empty());
    assert!(engine.list(&["x".to_string()]).unwrap().is_empty());
    assert!(engine.get("k").unwrap().is_none());
}

#[test]
fn state_is_identical_after_close_and_reopen() {
    let dir = tempdir().unwrap();
    {
        let engine = open(dir.path());
        engine.set("k1", "v1").unwrap();
        engine.set("k2", "v2").unwrap();
        engine.set("k3", "v3").unwrap();
        engine.tag("k1", "t1").unwrap();
        engine.tag("k2", "t2").unwrap();
        engine.tag("k3", "t3").unwrap();
        engine.untag("k3", "t3").unwrap();
    }

    let reopened = open(dir.path());
    let mut records = reopened.list(&[]).unwrap();
    records.sort_by(|a, b| a.key.cmp(&b.key));

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].tags, vec!["t1".to_string()]);
    assert_eq!(records[1].tags, vec!["t2".to_string()]);
    assert!(records[2].tags.is_empty());
}

#[test]
fn operations_against_a_missing_key_fail() {
    let dir = tempdir().unwrap();
    let engine = open(dir.path());

    assert!(matches!(engine.delete("ghost"), Err(Error::NotFound(_))));
    assert!(matches!(engine.tag("ghost", "x"), Err(Error::NotFound(_))));
    assert!(matches!(engine.untag("ghost", "x"), Err(Error::NotFound(_))));
}

#[test]
fn invalid_key_is_rejected_before_any_wal_write() {
    let dir = tempdir().unwrap();
    let engine = open(dir.path());

    let too_long = "a".repeat(51);
    assert!(matches!(engine.set(too_long, "v"), Err(Error::Validation(_))));
    assert!(engine.list(&[]).unwrap().is_empty());
}

#[test]
fn invalid_tag_is_rejected() {
    let dir = tempdir().unwrap();
    let engine = open(dir.path());

    engine.set("k", "v").unwrap();
    assert!(matches!(engine.tag("k", "Not_Valid"), Err(Error::Validation(_))));
}

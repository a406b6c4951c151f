mod common;

use common::node;
use inkmap::model::{Document, DEFAULT_ROOT_LABEL};
use inkmap::store::{Autosave, DocumentStore, FileStore};
use std::fs;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn sample_doc() -> Document {
    let mut doc = Document::new("doc1", "Manuscript");
    doc.root = node("root", vec![node("ch1", vec![node("hook", vec![])])]);
    doc.root.label = "Manuscript".to_string();
    doc
}

#[test]
fn test_file_store_save_and_load_cycle() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let doc = sample_doc();

    store
        .save(&doc.id, &doc.title, &doc.serialized_root().unwrap())
        .unwrap();
    let loaded = store.get("doc1").unwrap();
    assert_eq!(loaded, doc);
}

#[test]
fn test_file_store_wire_format() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let doc = sample_doc();
    store
        .save(&doc.id, &doc.title, &doc.serialized_root().unwrap())
        .unwrap();

    let raw = fs::read_to_string(dir.path().join("doc1.json")).unwrap();
    let outer: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(outer["id"], "doc1");
    assert_eq!(outer["title"], "Manuscript");

    // serializedRoot is itself a JSON string holding the {"root": Node} envelope
    let envelope: serde_json::Value =
        serde_json::from_str(outer["serializedRoot"].as_str().unwrap()).unwrap();
    assert_eq!(envelope["root"]["label"], "Manuscript");
    assert_eq!(envelope["root"]["children"][0]["id"], "ch1");
}

#[test]
fn test_file_store_missing_document() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    assert!(store.get("nope").is_err());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_corrupt_envelope_falls_back_to_fresh_root() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    fs::write(
        dir.path().join("doc1.json"),
        r#"{"id":"doc1","title":"Manuscript","serializedRoot":"{broken"}"#,
    )
    .unwrap();

    let doc = store.get("doc1").unwrap();
    assert_eq!(doc.title, "Manuscript");
    assert_eq!(doc.root.label, DEFAULT_ROOT_LABEL);
    assert!(doc.root.children.is_empty());
}

#[test]
fn test_list_skips_unreadable_files() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let doc = sample_doc();
    store
        .save(&doc.id, &doc.title, &doc.serialized_root().unwrap())
        .unwrap();
    fs::write(dir.path().join("junk.json"), "not json at all").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let metas = store.list().unwrap();
    assert_eq!(metas.len(), 1);
    assert_eq!(metas[0].id, "doc1");
}

#[test]
fn test_debounced_autosave_persists_after_quiet_period() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let doc = sample_doc();

    let t0 = Instant::now();
    let mut autosave = Autosave::new(true, Duration::from_millis(100));
    autosave.mark_dirty(t0);

    assert!(!autosave.poll(t0 + Duration::from_millis(10), || {
        store.save(&doc.id, &doc.title, &doc.serialized_root().unwrap())
    }));
    assert!(store.get("doc1").is_err());

    assert!(autosave.poll(t0 + Duration::from_millis(200), || {
        store.save(&doc.id, &doc.title, &doc.serialized_root().unwrap())
    }));
    assert_eq!(store.get("doc1").unwrap(), doc);
}

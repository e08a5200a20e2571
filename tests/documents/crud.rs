//! Add, insert, delete, touch and read paths

use std::sync::Arc;

use crate::common::*;
use docstore::{DocumentStore, MemoryTable};

#[test]
fn etags_strictly_increase_across_keys() {
    let t = TestStore::new();
    let mut last = Etag::EMPTY;
    for i in 0..50 {
        // Mix creates and updates of a handful of keys
        let etag = t.put(&format!("items/{}", i % 7));
        assert!(etag.is_greater_than(&last));
        last = etag;
    }
    assert_eq!(t.store.documents_count(), 7);
}

#[test]
fn keys_are_case_insensitive_but_case_preserving() {
    let t = TestStore::new();
    t.put("Users/Ayende");

    let doc = t.store.document_by_key("users/ayende").unwrap().unwrap();
    assert_eq!(doc.key, "Users/Ayende");

    // Writing with a different case updates the same document
    let updated = t
        .store
        .add_document("USERS/AYENDE", None, json!({"v": 2}), Metadata::new())
        .unwrap();
    assert!(updated.updated);
    assert_eq!(t.store.documents_count(), 1);
}

#[test]
fn stale_etag_rejected_and_document_unchanged() {
    let t = TestStore::new();
    let first = t.put("orders/1");
    let second = t
        .store
        .add_document("orders/1", Some(first), json!({"v": 2}), Metadata::new())
        .unwrap();

    let err = t
        .store
        .add_document("orders/1", Some(first), json!({"v": 3}), Metadata::new())
        .unwrap_err();
    let concurrency = err.as_concurrency().expect("concurrency error");
    assert_eq!(concurrency.kind, ConcurrencyKind::EtagMismatch);
    assert_eq!(concurrency.expected, Some(first));
    assert_eq!(concurrency.actual, Some(second.etag));

    let doc = t.store.document_by_key("orders/1").unwrap().unwrap();
    assert_eq!(doc.etag, second.etag);
    assert_eq!(doc.data, json!({"v": 2}));
}

#[test]
fn delete_then_lookups() {
    let t = TestStore::new();
    let etag = t.put_in("users/1", "Users");

    let deleted = t.store.delete_document("users/1", Some(etag)).unwrap().unwrap();
    assert_eq!(deleted.etag, etag);
    assert_eq!(deleted.metadata, collection_metadata("Users"));

    assert!(t.store.document_by_key("users/1").unwrap().is_none());
    assert!(t.store.document_metadata_by_key("users/1").unwrap().is_none());
    assert!(t.store.raw_document_by_key("users/1").unwrap().is_none());
    assert!(t.store.delete_document("users/1", None).unwrap().is_none());
    assert!(t.table.is_empty());
}

#[test]
fn touch_rotates_etag_only() {
    let t = TestStore::new();
    let etag = t.put_in("users/1", "Users");
    let before = t.store.document_by_key("users/1").unwrap().unwrap();

    let touched = t.store.touch("users/1").unwrap().unwrap();
    assert_eq!(touched.pre_etag, etag);

    let after = t.store.document_by_key("users/1").unwrap().unwrap();
    assert_eq!(after.etag, touched.post_etag);
    assert_eq!(after.data, before.data);
    assert_eq!(after.metadata, before.metadata);
    assert_eq!(after.last_modified, before.last_modified);
    assert_eq!(t.store.touches().get(&etag), Some(touched.post_etag));

    // A second touch chains in the ledger
    let again = t.store.touch("users/1").unwrap().unwrap();
    assert_eq!(t.store.touches().resolve(etag), again.post_etag);

    // Touch moves the document to the end of etag order
    let other = t.put("users/2");
    let order = t.scan_keys(Etag::EMPTY, ScanOptions::new(10));
    assert_eq!(order, vec!["users/1", "users/2"]);
    assert!(other.is_greater_than(&again.post_etag));
}

#[test]
fn compressed_documents_roundtrip() {
    let t = TestStore::compressed();
    let body = json!({"text": "lorem ipsum ".repeat(200)});
    t.store
        .add_document("articles/1", None, body.clone(), Metadata::new())
        .unwrap();

    let raw = t.store.raw_document_by_key("articles/1").unwrap().unwrap();
    assert!(raw.len() < serde_json::to_vec(&body).unwrap().len());
    assert_eq!(t.store.document_by_key("articles/1").unwrap().unwrap().data, body);
}

#[test]
fn compressed_documents_unreadable_without_codec() {
    let t = TestStore::compressed();
    t.store
        .add_document("articles/1", None, json!({"a": 1}), Metadata::new())
        .unwrap();

    let plain = DocumentStore::builder(Arc::clone(&t.table) as Arc<dyn DocumentTable>)
        .no_cache()
        .build()
        .unwrap();
    match plain.document_by_key("articles/1") {
        Err(Error::MissingCodec { key, .. }) => assert_eq!(key, "articles/1"),
        other => panic!("expected MissingCodec, got {:?}", other),
    }
    // Metadata is stored raw and stays readable
    assert!(plain.document_metadata_by_key("articles/1").unwrap().is_some());
}

#[test]
fn plain_documents_readable_after_enabling_compression() {
    let table = Arc::new(MemoryTable::new());
    let plain = DocumentStore::builder(Arc::clone(&table) as Arc<dyn DocumentTable>)
        .build()
        .unwrap();
    plain
        .add_document("k", None, json!({"old": true}), Metadata::new())
        .unwrap();

    let compressed = DocumentStore::from_config(
        table,
        &StoreConfig {
            compression: true,
            ..StoreConfig::default()
        },
    )
    .unwrap();
    assert_eq!(
        compressed.document_by_key("k").unwrap().unwrap().data,
        json!({"old": true})
    );
}

#[test]
fn key_length_limit_is_utf16_units() {
    let t = TestStore::new();
    // Each of these is two UTF-16 units
    let emoji_key: String = "😀".repeat(512);
    assert!(t
        .store
        .add_document(&emoji_key, None, json!(1), Metadata::new())
        .is_ok());

    let too_long = format!("{}a", emoji_key);
    match t.store.add_document(&too_long, None, json!(1), Metadata::new()) {
        Err(Error::KeyTooLarge { length, max, .. }) => {
            assert_eq!(length, 1025);
            assert_eq!(max, 1024);
        }
        other => panic!("expected KeyTooLarge, got {:?}", other),
    }
}

#[test]
fn injected_generator_controls_etags() {
    let store = DocumentStore::builder(Arc::new(MemoryTable::new()))
        .etag_generator(Arc::new(FixedRestartsGenerator::new(7)))
        .build()
        .unwrap();
    let result = store.add_document("k", None, json!(1), Metadata::new()).unwrap();
    assert_eq!(result.etag, Etag::new(7, 1000));
    assert_eq!(result.etag.to_string(), "00000000-0000-0007-0000-0000000003e8");
}

//! Diagnostics statistics and the live document counter

use proptest::prelude::*;

use crate::common::*;
use docstore::{DELETE_MARKER_METADATA_KEY, SYSTEM_KEY_PREFIX};

#[test]
fn stats_group_by_collection() {
    let t = TestStore::new();
    t.put_in("users/1", "Users");
    t.put_in("users/2", "Users");
    t.put_in("orders/1", "Orders");
    t.put(&format!("{}hilo/users", SYSTEM_KEY_PREFIX));

    let mut tombstone = collection_metadata("Orders");
    tombstone.insert(DELETE_MARKER_METADATA_KEY.to_string(), json!(true));
    t.store
        .add_document("orders/2", None, json!({}), tombstone)
        .unwrap();

    let stats = t.store.document_stats(&CancellationToken::new()).unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.collections["Users"].count, 2);
    assert_eq!(stats.collections["Orders"].count, 2);
    assert_eq!(stats.system.count, 1);
    assert_eq!(stats.no_collection.count, 1);
    assert_eq!(stats.tombstones, 1);
    assert_eq!(
        stats.total_size,
        stats.collections.values().map(|c| c.total_size).sum::<u64>() + stats.no_collection.total_size
    );
}

#[test]
fn stats_serialize_to_json() {
    let t = TestStore::new();
    t.put_in("users/1", "Users");
    let stats = t.store.document_stats(&CancellationToken::new()).unwrap();
    let value = serde_json::to_value(&stats).unwrap();
    assert_eq!(value["collections"]["Users"]["count"], json!(1));
}

#[derive(Debug, Clone)]
enum Op {
    Put(u8),
    Insert(u8),
    Delete(u8),
    Touch(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..16).prop_map(Op::Put),
        (0u8..16).prop_map(Op::Insert),
        (0u8..16).prop_map(Op::Delete),
        (0u8..16).prop_map(Op::Touch),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn counter_equals_creates_minus_deletes(ops in prop::collection::vec(op(), 0..60)) {
        let t = TestStore::new();
        let mut live = std::collections::HashSet::new();

        for op in ops {
            match op {
                Op::Put(k) => {
                    t.store.add_document(&format!("k/{}", k), None, json!(k), Metadata::new()).unwrap();
                    live.insert(k);
                }
                Op::Insert(k) => {
                    let result = t.store.insert_document(&format!("k/{}", k), json!(k), Metadata::new(), false);
                    prop_assert_eq!(result.is_ok(), !live.contains(&k));
                    live.insert(k);
                }
                Op::Delete(k) => {
                    let deleted = t.store.delete_document(&format!("k/{}", k), None).unwrap();
                    prop_assert_eq!(deleted.is_some(), live.remove(&k));
                }
                Op::Touch(k) => {
                    let touched = t.store.touch(&format!("k/{}", k)).unwrap();
                    prop_assert_eq!(touched.is_some(), live.contains(&k));
                }
            }
        }

        let stats = t.store.document_stats(&CancellationToken::new()).unwrap();
        prop_assert_eq!(stats.total, live.len() as u64);
        prop_assert_eq!(t.table.len(), live.len());
    }
}

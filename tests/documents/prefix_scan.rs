//! Prefix key-range scans

use crate::common::*;

fn keys(t: &TestStore, prefix: &str, start: usize, take: usize, skip_after: Option<&str>) -> Vec<String> {
    t.store
        .scan_by_prefix(prefix, start, take, skip_after)
        .map(|d| d.unwrap().key)
        .collect()
}

#[test]
fn relaxed_prefix_matches_separator_and_case_variants() {
    let t = TestStore::new();
    t.put("Users/1");
    t.put("USERS-2");
    t.put("Customers/1");

    assert_eq!(keys(&t, "Users/", 0, 10, None), vec!["Users/1", "USERS-2"]);
}

#[test]
fn paging_with_skip_after() {
    let t = TestStore::new();
    for i in 1..=6 {
        t.put(&format!("orders/{}", i));
    }
    t.put("products/1");

    let first = keys(&t, "orders/", 0, 4, None);
    assert_eq!(first, vec!["orders/1", "orders/2", "orders/3", "orders/4"]);

    let second = keys(&t, "orders/", 0, 4, Some(first.last().unwrap().as_str()));
    assert_eq!(second, vec!["orders/5", "orders/6"]);
}

#[test]
fn start_skips_matching_records() {
    let t = TestStore::new();
    for i in 1..=5 {
        t.put(&format!("users/{}", i));
    }
    assert_eq!(keys(&t, "users/", 3, 10, None), vec!["users/4", "users/5"]);
    assert!(keys(&t, "users/", 5, 10, None).is_empty());
}

#[test]
fn documents_are_fully_decoded() {
    let t = TestStore::compressed();
    t.put_in("users/1", "Users");

    let doc = t
        .store
        .scan_by_prefix("users", 0, 1, None)
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(doc.data, json!({"id": "users/1"}));
    assert_eq!(doc.collection(), Some("Users"));
}

#[test]
fn prefix_with_no_records() {
    let t = TestStore::new();
    t.put("users/1");
    assert!(keys(&t, "zebras/", 0, 10, None).is_empty());
}

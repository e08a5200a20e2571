//! Etag-ordered enumeration, skip-ahead and reverse order

use std::cell::Cell;

use crate::common::*;

fn five_docs() -> (TestStore, Vec<Etag>) {
    let t = TestStore::new();
    let etags = ["a", "b", "c", "d", "e"].iter().map(|k| t.put(k)).collect();
    (t, etags)
}

#[test]
fn take_three_of_five() {
    let (t, etags) = five_docs();
    let checkpoint = Cell::new(None);
    let mut scan = t
        .store
        .scan_after(Etag::EMPTY, ScanOptions::new(3))
        .on_last_processed(|etag| checkpoint.set(etag));

    let docs: Vec<Document> = scan.by_ref().map(Result::unwrap).collect();
    assert_eq!(docs.len(), 3);
    assert!(!scan.early_exit());
    drop(scan);
    assert_eq!(checkpoint.get(), Some(etags[2]));
}

#[test]
fn paging_with_checkpoints_visits_everything_once() {
    let (t, _) = five_docs();
    let mut seen = Vec::new();
    let mut checkpoint = Etag::EMPTY;
    loop {
        let mut scan = t.store.scan_after(checkpoint, ScanOptions::new(2));
        let page: Vec<String> = scan.by_ref().map(|d| d.unwrap().key).collect();
        if page.is_empty() {
            break;
        }
        checkpoint = scan.last_processed().unwrap();
        seen.extend(page);
    }
    assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn updates_move_documents_to_the_end() {
    let (t, etags) = five_docs();
    t.put("b");
    let keys = t.scan_keys(etags[0], ScanOptions::new(10));
    assert_eq!(keys, vec!["c", "d", "e", "b"]);
}

#[test]
fn deleted_documents_leave_the_scan() {
    let (t, _) = five_docs();
    t.store.delete_document("c", None).unwrap();
    assert_eq!(
        t.scan_keys(Etag::EMPTY, ScanOptions::new(10)),
        vec!["a", "b", "d", "e"]
    );
}

#[test]
fn prefix_and_until_combined() {
    let t = TestStore::new();
    t.put("users/1");
    t.put("orders/1");
    let until = t.put("users/2");
    t.put("users/3");

    let mut scan = t.store.scan_after(
        Etag::EMPTY,
        ScanOptions::new(10)
            .with_prefix("USERS/")
            .with_until_etag(until),
    );
    let keys: Vec<String> = scan.by_ref().map(|d| d.unwrap().key).collect();
    assert_eq!(keys, vec!["users/1", "users/2"]);
    assert!(!scan.early_exit());
}

#[test]
fn canceled_scan_stops_with_error() {
    let (t, _) = five_docs();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let results: Vec<_> = t
        .store
        .documents_after(Etag::EMPTY, 10, cancel)
        .collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(Error::Canceled)));
}

#[test]
fn skip_ahead_bounds_a_follow_up_scan() {
    let (t, etags) = five_docs();
    let cancel = CancellationToken::new();

    // Seek to the first document after EMPTY, then move three more
    let landed = t.store.etag_after_skip(Etag::EMPTY, 3, &cancel).unwrap();
    assert_eq!(landed, etags[3]);

    let bounded: Vec<String> = t
        .store
        .scan_after(Etag::EMPTY, ScanOptions::new(100))
        .map(|d| d.unwrap())
        .take_while(|d| !d.etag.is_greater_than(&landed))
        .map(|d| d.key)
        .collect();
    assert_eq!(bounded.len(), 4);

    assert_eq!(t.store.etag_after_skip(etags[3], 10, &cancel).unwrap(), etags[4]);
    assert_eq!(t.store.etag_after_skip(etags[4], 10, &cancel).unwrap(), etags[4]);
}

#[test]
fn skip_ahead_with_more_records_than_take() {
    let (t, etags) = five_docs();
    let cancel = CancellationToken::new();

    assert_eq!(t.store.etag_after_skip(Etag::EMPTY, 2, &cancel).unwrap(), etags[2]);
    assert_eq!(t.store.etag_after_skip(Etag::EMPTY, 0, &cancel).unwrap(), etags[0]);
    assert_eq!(t.store.etag_after_skip(etags[1], 1, &cancel).unwrap(), etags[3]);
}

#[test]
fn reverse_update_order_newest_first() {
    let (t, _) = five_docs();
    t.store.touch("a").unwrap();
    let keys: Vec<String> = t
        .store
        .documents_by_reverse_update_order(1, 2)
        .unwrap()
        .into_iter()
        .map(|d| d.key)
        .collect();
    assert_eq!(keys, vec!["e", "d"]);
}

#[test]
fn best_next_etag_follows_writes() {
    let (t, etags) = five_docs();
    assert_eq!(t.store.best_next_document_etag(etags[1]).unwrap(), etags[2]);
    t.store.delete_document("c", None).unwrap();
    assert_eq!(t.store.best_next_document_etag(etags[1]).unwrap(), etags[3]);
}

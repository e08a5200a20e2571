//! Concurrent writers against one store

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::common::*;

#[test]
fn concurrent_creates_get_unique_etags() {
    let t = Arc::new(TestStore::new());
    let threads = 8;
    let per_thread = 100;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|n| {
            let t = Arc::clone(&t);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..per_thread)
                    .map(|i| t.put(&format!("t{}/{}", n, i)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        for etag in handle.join().unwrap() {
            assert!(all.insert(etag), "duplicate etag {}", etag);
        }
    }
    assert_eq!(all.len(), threads * per_thread);
    assert_eq!(t.store.documents_count(), (threads * per_thread) as u64);
}

#[test]
fn racing_updates_with_same_expected_etag_one_wins() {
    let t = Arc::new(TestStore::new());
    let base = t.put("contended");
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|n| {
            let t = Arc::clone(&t);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                t.store
                    .add_document("contended", Some(base), json!({ "writer": n }), Metadata::new())
            })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => wins += 1,
            Err(e) => {
                let kind = e.as_concurrency().expect("concurrency error").kind;
                assert!(
                    kind == ConcurrencyKind::EtagMismatch || kind == ConcurrencyKind::ConcurrentWrite,
                    "unexpected kind {:?}",
                    kind
                );
            }
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(t.store.documents_count(), 1);
}

#[test]
fn concurrent_creates_and_deletes_keep_counter_exact() {
    let t = Arc::new(TestStore::new());
    for i in 0..200 {
        t.put(&format!("doomed/{}", i));
    }

    let deleter = {
        let t = Arc::clone(&t);
        thread::spawn(move || {
            for i in 0..200 {
                t.store.delete_document(&format!("doomed/{}", i), None).unwrap();
            }
        })
    };
    let creator = {
        let t = Arc::clone(&t);
        thread::spawn(move || {
            for i in 0..150 {
                t.put(&format!("kept/{}", i));
            }
        })
    };
    deleter.join().unwrap();
    creator.join().unwrap();

    assert_eq!(t.store.documents_count(), 150);
    assert_eq!(t.table.len(), 150);
}

#[test]
fn checkpointed_reader_sees_every_concurrent_write() {
    let t = Arc::new(TestStore::new());
    let threads = 4;
    let per_thread = 250;
    let barrier = Arc::new(Barrier::new(threads + 1));
    let writing = Arc::new(AtomicBool::new(true));

    let writers: Vec<_> = (0..threads)
        .map(|n| {
            let t = Arc::clone(&t);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    t.put(&format!("w{}/{}", n, i));
                }
            })
        })
        .collect();

    let reader = {
        let t = Arc::clone(&t);
        let barrier = Arc::clone(&barrier);
        let writing = Arc::clone(&writing);
        thread::spawn(move || {
            let mut checkpoint = Etag::EMPTY;
            let mut seen = Vec::new();
            let read_batch = |checkpoint: &mut Etag, seen: &mut Vec<String>| {
                for doc in t.store.scan_after(*checkpoint, ScanOptions::new(64)) {
                    let doc = doc.unwrap();
                    *checkpoint = doc.etag;
                    seen.push(doc.key);
                }
            };
            barrier.wait();
            while writing.load(Ordering::Acquire) {
                read_batch(&mut checkpoint, &mut seen);
            }
            // Drain whatever committed after the last pass
            loop {
                let before = seen.len();
                read_batch(&mut checkpoint, &mut seen);
                if seen.len() == before {
                    break;
                }
            }
            seen
        })
    };

    for handle in writers {
        handle.join().unwrap();
    }
    writing.store(false, Ordering::Release);
    let seen = reader.join().unwrap();

    let unique: HashSet<_> = seen.iter().cloned().collect();
    assert_eq!(unique.len(), seen.len(), "a document was read twice");
    assert_eq!(seen.len(), threads * per_thread, "a document was skipped by the checkpoint");
}

//! Document store integration tests
//!
//! Exercise the full stack (store + codecs + cache + in-memory table) through
//! the public `docstore` API.

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod crud;
mod etag_scan;
mod prefix_scan;
mod stats;

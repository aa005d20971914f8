//! Transparent HTTP cache primitives.
//!
//! This module provides the storage side of the fetch-or-revalidate
//! pipeline:
//!
//! - URL-addressed storage keys using SHA-256 hashing
//! - Cache entry metadata with ETag / Last-Modified validators
//! - A bounded in-memory entry map with LRU eviction
//! - An on-disk content store with JSON sidecar metadata per URL
//! - A bounded snapshot persisted at shutdown and restored at startup
//!
//! The network side lives in the client crate; entries here never hold raw
//! body bytes once persisted, only a reference into the content store.

pub mod entry;
pub mod hash;
pub mod snapshot;
pub mod store;

pub use entry::{CacheEntry, EntryCache, Validators};
pub use hash::url_hash;
pub use store::ContentStore;

//! Response cache for catalog API data
//!
//! This module provides a session-wide cache partitioned into catalog
//! listings, artwork lookups, and item detail records, each with its own
//! expiry policy. The cache hydrates from and debounce-persists to a single
//! durable JSON snapshot, so fresh data survives process restarts without
//! ever blocking or failing the caller.

mod storage;
mod store;

pub use storage::{FileStore, MemoryFailure, MemoryStore, SnapshotStore, StorageError};
pub use store::{
    CacheConfig, Clock, MediaCache, Section, SystemClock, KEY_SEPARATOR, SNAPSHOT_KEY,
};

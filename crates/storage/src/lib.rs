// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

// Ordered key-value store abstraction backing the event bus.
//
// Mirrors the shape of an embedded LSM store (open transactions, a
// durable `set` with an optional absolute expiry, ordered prefix
// iteration) without committing to any particular on-disk engine.
// `MemoryStore` is the only implementation for now; a disk-backed one
// can be dropped in behind the same traits later.

mod entry;
mod error;
mod memory;

pub use entry::Entry;
pub use error::{Result, StorageError};
pub use memory::MemoryStore;

/// A single logical key-value namespace with transactional mutation and a
/// parallel, read-only prefix scan for large sweeps.
pub trait KeyValueStore: Send + Sync {
    /// Starts a transaction. `writable` transactions buffer their writes
    /// until `commit`; read-only transactions may only `iter_prefix`.
    fn begin(&self, writable: bool) -> Result<Box<dyn Transaction + '_>>;

    /// Scans every live (non-expired) key under `prefix`, optionally
    /// rejecting keys with `choose` before their value is materialized.
    /// Fans out across up to [`NUM_SCAN_WORKERS`] workers; the returned
    /// pairs are in ascending key order regardless of the fan-out.
    fn scan(
        &self,
        prefix: &[u8],
        choose: Option<&(dyn Fn(&[u8]) -> bool + Sync)>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Releases the store. Further operations return [`StorageError::Closed`].
    fn close(&self) -> Result<()>;
}

/// A transaction over a [`KeyValueStore`].
pub trait Transaction {
    /// Buffers a write. `expires_at_ns` is an absolute Unix timestamp in
    /// nanoseconds; `None` means the key never expires.
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>, expires_at_ns: Option<u64>) -> Result<()>;

    /// Buffers a delete. Deleting a missing key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Ordered iteration over live keys under `prefix`, as of the
    /// transaction's start plus any of its own buffered writes.
    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Applies all buffered writes atomically.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Discards buffered writes without applying them.
    fn discard(self: Box<Self>);
}

/// Worker fan-out used by [`KeyValueStore::scan`], matching the original
/// service's `NumGo: 16` stream configuration.
pub const NUM_SCAN_WORKERS: usize = 16;

/// Events are retained for 30 days past their creation before the
/// periodic reaper is free to drop them.
pub const DEFAULT_TTL_NS: u64 = 720 * 60 * 60 * 1_000_000_000;

pub(crate) fn now_ns() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos() as u64
}

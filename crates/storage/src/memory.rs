// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;

use crate::{Entry, KeyValueStore, NUM_SCAN_WORKERS, Result, StorageError, Transaction, now_ns};

const REAPER_INTERVAL: Duration = Duration::from_secs(60);

struct Shared {
    data: RwLock<BTreeMap<Vec<u8>, Entry>>,
    closed: AtomicBool,
    /// Serializes writable transactions; reads never block on this.
    write_gate: Mutex<()>,
}

/// An in-memory, BTreeMap-backed [`KeyValueStore`].
///
/// Keys sort lexicographically, which is what lets the bus engine encode
/// chronological order directly into event keys. Not durable across
/// restarts; a disk-backed store would slot in behind the same traits.
pub struct MemoryStore {
    shared: Arc<Shared>,
    reaper: Option<std::thread::JoinHandle<()>>,
}

impl MemoryStore {
    pub fn open() -> Self {
        let shared = Arc::new(Shared {
            data: RwLock::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
            write_gate: Mutex::new(()),
        });

        let reaper_shared = Arc::clone(&shared);
        let reaper = std::thread::spawn(move || {
            while !reaper_shared.closed.load(Ordering::Acquire) {
                std::thread::sleep(REAPER_INTERVAL);
                if reaper_shared.closed.load(Ordering::Acquire) {
                    break;
                }
                reap_expired(&reaper_shared);
            }
        });

        Self { shared, reaper: Some(reaper) }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.closed.load(Ordering::Acquire) { Err(StorageError::Closed) } else { Ok(()) }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::open()
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        if let Some(handle) = self.reaper.take() {
            let _ = handle.join();
        }
    }
}

fn reap_expired(shared: &Shared) {
    let now = now_ns();
    let mut data = shared.data.write();
    let expired: Vec<Vec<u8>> =
        data.iter().filter(|(_, e)| e.is_expired(now)).map(|(k, _)| k.clone()).collect();
    if !expired.is_empty() {
        tracing::debug!(count = expired.len(), "reaping expired keys");
    }
    for key in expired {
        data.remove(&key);
    }
}

fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.last_mut() {
        if *last == 0xff {
            end.pop();
        } else {
            *last += 1;
            return Some(end);
        }
    }
    None
}

fn prefix_range(prefix: &[u8]) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let start = Bound::Included(prefix.to_vec());
    let end = match prefix_upper_bound(prefix) {
        Some(e) => Bound::Excluded(e),
        None => Bound::Unbounded,
    };
    (start, end)
}

impl KeyValueStore for MemoryStore {
    fn begin(&self, writable: bool) -> Result<Box<dyn Transaction + '_>> {
        self.ensure_open()?;
        Ok(Box::new(MemoryTransaction::new(&self.shared, writable)))
    }

    fn scan(
        &self,
        prefix: &[u8],
        choose: Option<&(dyn Fn(&[u8]) -> bool + Sync)>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.ensure_open()?;
        let now = now_ns();

        let snapshot: Vec<(Vec<u8>, Entry)> = {
            let data = self.shared.data.read();
            data.range(prefix_range(prefix)).map(|(k, e)| (k.clone(), e.clone())).collect()
        };

        if snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = snapshot.len().div_ceil(NUM_SCAN_WORKERS).max(1);
        let results: Vec<(Vec<u8>, Vec<u8>)> = snapshot
            .par_chunks(chunk_size)
            .flat_map_iter(|chunk| {
                chunk
                    .iter()
                    .filter(|(k, _)| choose.map_or(true, |f| f(k)))
                    .filter(|(_, e)| !e.is_expired(now))
                    .map(|(k, e)| (k.clone(), e.value.clone()))
            })
            .collect();

        Ok(results)
    }

    fn close(&self) -> Result<()> {
        self.shared.closed.store(true, Ordering::Release);
        Ok(())
    }
}

enum PendingOp {
    Set { key: Vec<u8>, value: Vec<u8>, expires_at_ns: Option<u64> },
    Delete { key: Vec<u8> },
}

/// A transaction over [`MemoryStore`].
///
/// Writable transactions hold the store's write gate for their lifetime,
/// serializing commits; writes are buffered and applied only on `commit`.
/// Reads made through `iter_prefix` see the transaction's own pending
/// writes layered over the committed snapshot.
struct MemoryTransaction<'s> {
    shared: &'s Shared,
    writable: bool,
    pending: Vec<PendingOp>,
    _gate: Option<parking_lot::MutexGuard<'s, ()>>,
    finished: bool,
}

impl<'s> MemoryTransaction<'s> {
    fn new(shared: &'s Shared, writable: bool) -> Self {
        let gate = if writable { Some(shared.write_gate.lock()) } else { None };
        Self { shared, writable, pending: Vec::new(), _gate: gate, finished: false }
    }
}

impl<'s> Transaction for MemoryTransaction<'s> {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>, expires_at_ns: Option<u64>) -> Result<()> {
        if !self.writable {
            return Err(StorageError::ReadOnly);
        }
        if self.finished {
            return Err(StorageError::TransactionFinished);
        }
        self.pending.push(PendingOp::Set { key, value, expires_at_ns });
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(StorageError::ReadOnly);
        }
        if self.finished {
            return Err(StorageError::TransactionFinished);
        }
        self.pending.push(PendingOp::Delete { key: key.to_vec() });
        Ok(())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        if self.finished {
            return Err(StorageError::TransactionFinished);
        }
        let now = now_ns();
        let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> = {
            let data = self.shared.data.read();
            data.range(prefix_range(prefix))
                .filter(|(_, e)| !e.is_expired(now))
                .map(|(k, e)| (k.clone(), Some(e.value.clone())))
                .collect()
        };

        for op in &self.pending {
            match op {
                PendingOp::Set { key, value, .. } if key.starts_with(prefix) => {
                    merged.insert(key.clone(), Some(value.clone()));
                }
                PendingOp::Delete { key } if key.starts_with(prefix) => {
                    merged.insert(key.clone(), None);
                }
                _ => {}
            }
        }

        Ok(merged.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))).collect())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        if !self.writable {
            return Err(StorageError::ReadOnly);
        }
        if self.finished {
            return Err(StorageError::TransactionFinished);
        }
        self.finished = true;
        let mut data = self.shared.data.write();
        for op in self.pending.drain(..) {
            match op {
                PendingOp::Set { key, value, expires_at_ns } => {
                    data.insert(key, Entry { value, expires_at_ns });
                }
                PendingOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn discard(mut self: Box<Self>) {
        self.finished = true;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_makes_writes_visible_to_later_transactions() {
        let store = MemoryStore::open();
        let mut txn = store.begin(true).unwrap();
        txn.set(b"stream:a".to_vec(), b"{}".to_vec(), None).unwrap();
        txn.commit().unwrap();

        let txn = store.begin(false).unwrap();
        let found = txn.iter_prefix(b"stream:").unwrap();
        assert_eq!(found, vec![(b"stream:a".to_vec(), b"{}".to_vec())]);
    }

    #[test]
    fn discard_drops_buffered_writes() {
        let store = MemoryStore::open();
        let mut txn = store.begin(true).unwrap();
        txn.set(b"stream:a".to_vec(), b"{}".to_vec(), None).unwrap();
        txn.discard();

        let txn = store.begin(false).unwrap();
        assert!(txn.iter_prefix(b"stream:").unwrap().is_empty());
    }

    #[test]
    fn read_only_transaction_rejects_writes() {
        let store = MemoryStore::open();
        let mut txn = store.begin(false).unwrap();
        assert!(matches!(txn.set(b"k".to_vec(), b"v".to_vec(), None), Err(StorageError::ReadOnly)));
        assert!(matches!(txn.delete(b"k"), Err(StorageError::ReadOnly)));
    }

    #[test]
    fn iter_prefix_sees_own_pending_writes_before_commit() {
        let store = MemoryStore::open();
        let mut txn = store.begin(true).unwrap();
        txn.set(b"event:s1:0:a".to_vec(), b"1".to_vec(), None).unwrap();
        let seen = txn.iter_prefix(b"event:s1:").unwrap();
        assert_eq!(seen, vec![(b"event:s1:0:a".to_vec(), b"1".to_vec())]);
        txn.discard();
    }

    #[test]
    fn expired_entries_are_excluded_from_scan_and_iter() {
        let store = MemoryStore::open();
        let mut txn = store.begin(true).unwrap();
        txn.set(b"event:s1:0:a".to_vec(), b"1".to_vec(), Some(1)).unwrap();
        txn.commit().unwrap();

        let scanned = store.scan(b"event:", None).unwrap();
        assert!(scanned.is_empty(), "entry with expiry in the past must not be returned");

        let txn = store.begin(false).unwrap();
        assert!(txn.iter_prefix(b"event:").unwrap().is_empty());
    }

    #[test]
    fn scan_applies_choose_filter_before_materializing_value() {
        let store = MemoryStore::open();
        let mut txn = store.begin(true).unwrap();
        txn.set(b"event:s1:0:keep".to_vec(), b"1".to_vec(), None).unwrap();
        txn.set(b"event:s1:0:drop".to_vec(), b"2".to_vec(), None).unwrap();
        txn.commit().unwrap();

        let found = store.scan(b"event:", Some(&|k: &[u8]| k.ends_with(b"keep"))).unwrap();
        assert_eq!(found, vec![(b"event:s1:0:keep".to_vec(), b"1".to_vec())]);
    }

    #[test]
    fn scan_respects_prefix_boundary() {
        let store = MemoryStore::open();
        let mut txn = store.begin(true).unwrap();
        txn.set(b"stream:a".to_vec(), b"1".to_vec(), None).unwrap();
        txn.set(b"stream;".to_vec(), b"2".to_vec(), None).unwrap();
        txn.commit().unwrap();

        let found = store.scan(b"stream:", None).unwrap();
        assert_eq!(found, vec![(b"stream:a".to_vec(), b"1".to_vec())]);
    }

    #[test]
    fn closed_store_rejects_new_transactions() {
        let store = MemoryStore::open();
        store.close().unwrap();
        assert!(matches!(store.begin(true), Err(StorageError::Closed)));
    }
}

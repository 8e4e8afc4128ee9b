// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use std::collections::HashMap;
use std::net::TcpStream;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Tracks every currently-open connection by a monotonically increasing
/// id, so a shutdown can close them all without waiting for their own
/// request loops to notice.
///
/// Guarded by a single mutex held only for the duration of an
/// insert/remove; it never overlaps with the bus lock or a connection's
/// own blocking I/O.
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    conns: Mutex<HashMap<u64, TcpStream>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self { next_id: AtomicU64::new(0), conns: Mutex::new(HashMap::new()) }
    }

    /// Registers `conn` and returns the id it was assigned.
    pub fn add(&self, conn: TcpStream) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.conns.lock().insert(id, conn);
        id
    }

    /// Removes and closes the connection for `id`. A missing id is a
    /// no-op: the connection may already have closed itself.
    pub fn close(&self, id: u64) {
        if let Some(conn) = self.conns.lock().remove(&id) {
            let _ = conn.shutdown(std::net::Shutdown::Both);
        }
    }

    /// Closes every currently registered connection.
    pub fn close_all(&self) {
        let mut conns = self.conns.lock();
        for (_, conn) in conns.drain() {
            let _ = conn.shutdown(std::net::Shutdown::Both);
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{TcpListener, TcpStream};

    use super::*;

    fn connected_pair() -> TcpStream {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        drop(client);
        server_side
    }

    #[test]
    fn add_assigns_increasing_ids() {
        let registry = ConnectionRegistry::new();
        let a = registry.add(connected_pair());
        let b = registry.add(connected_pair());
        assert!(b > a);
    }

    #[test]
    fn close_of_missing_id_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        registry.close(999);
    }

    #[test]
    fn close_all_empties_the_registry() {
        let registry = ConnectionRegistry::new();
        registry.add(connected_pair());
        registry.add(connected_pair());
        registry.close_all();
        assert_eq!(registry.conns.lock().len(), 0);
    }
}

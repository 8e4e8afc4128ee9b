// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use eventbus_storage::{DEFAULT_TTL_NS, KeyValueStore, Transaction};
use parking_lot::RwLock;
use serde_json::value::RawValue;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{BusError, Result};
use crate::key::{self, EVENT_PREFIX, STREAM_PREFIX};
use crate::model::{Event, Stream, validate_status};

/// The bus engine: an in-memory stream registry backed by a transactional
/// key-value store.
///
/// Every mutator (including the read-heavy listing operations) takes the
/// registry's writer lock for its full duration, including the KV
/// transaction; only `get_stream_info` takes a read lock. This keeps the
/// in-memory name index and the persisted `stream:` prefix from ever
/// diverging, at the cost of serializing all bus traffic.
pub struct Bus {
    store: Arc<dyn KeyValueStore>,
    streams: RwLock<HashMap<String, Stream>>,
}

impl Bus {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, streams: RwLock::new(HashMap::new()) }
    }

    /// Rebuilds the name -> stream map from the persisted `stream:` prefix.
    /// Safe to call more than once; a later call simply replaces the map.
    #[instrument(skip(self))]
    pub fn init(&self) -> Result<()> {
        let rows = self.store.scan(STREAM_PREFIX, None)?;
        let mut rebuilt = HashMap::with_capacity(rows.len());
        for (_, value) in rows {
            let stream: Stream = serde_json::from_slice(&value)?;
            rebuilt.insert(stream.name.clone(), stream);
        }
        let mut streams = self.streams.write();
        let count = rebuilt.len();
        *streams = rebuilt;
        debug!(count, "bus init rebuilt stream registry");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn create_stream(&self, name: &str) -> Result<Stream> {
        let mut streams = self.streams.write();
        if streams.contains_key(name) {
            return Err(BusError::StreamAlreadyExists(name.to_string()));
        }

        let stream = Stream { id: Uuid::new_v4().to_string(), name: name.to_string(), created_at: Utc::now() };

        let mut txn = self.store.begin(true)?;
        txn.set(key::stream_key(&stream.id), serde_json::to_vec(&stream)?, None)?;
        txn.commit()?;

        streams.insert(stream.name.clone(), stream.clone());
        Ok(stream)
    }

    #[instrument(skip(self))]
    pub fn delete_stream(&self, name: &str) -> Result<()> {
        let mut streams = self.streams.write();
        let stream = streams.get(name).cloned().ok_or_else(|| BusError::StreamNotFound(name.to_string()))?;

        let mut txn = self.store.begin(true)?;
        let events = txn.iter_prefix(&key::event_stream_prefix(&stream.id))?;
        for (event_key, _) in events {
            txn.delete(&event_key)?;
        }
        txn.delete(&key::stream_key(&stream.id))?;
        txn.commit()?;

        streams.remove(name);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn get_stream_info(&self, name: &str) -> Result<Stream> {
        let streams = self.streams.read();
        streams.get(name).cloned().ok_or_else(|| BusError::StreamNotFound(name.to_string()))
    }

    #[instrument(skip(self))]
    pub fn get_stream_events(&self, name: &str) -> Result<Vec<Event>> {
        let streams = self.streams.write();
        let stream = streams.get(name).ok_or_else(|| BusError::StreamNotFound(name.to_string()))?;
        let rows = self.store.scan(&key::event_stream_prefix(&stream.id), None)?;
        Ok(decode_events_skipping_failures(rows))
    }

    #[instrument(skip(self, body))]
    pub fn write_event(&self, name: &str, body: Box<RawValue>) -> Result<Event> {
        let streams = self.streams.write();
        let stream = streams.get(name).ok_or_else(|| BusError::StreamNotFound(name.to_string()))?;

        let event = Event {
            id: Uuid::new_v4().to_string(),
            stream_id: stream.id.clone(),
            status: crate::model::STATUS_UNPROCESSED,
            created_at: Utc::now(),
            body,
        };

        let mut txn = self.store.begin(true)?;
        let k = key::event_key(&event.stream_id, event.status, event.created_at, &event.id);
        let expires_at_ns = event.created_at.timestamp_nanos_opt().map(|t| t as u64 + DEFAULT_TTL_NS);
        txn.set(k, serde_json::to_vec(&event)?, expires_at_ns)?;
        txn.commit()?;

        Ok(event)
    }

    /// Locates the event by id (its stream is not known ahead of time),
    /// deletes every status-suffixed key that currently holds it, and
    /// writes it back under the key for `status`.
    #[instrument(skip(self))]
    pub fn mark_event(&self, event_id: &str, status: u8) -> Result<()> {
        validate_status(status)?;
        let _streams = self.streams.write();

        let choose = |k: &[u8]| key::key_matches_event_id(k, event_id);
        let rows = self.store.scan(EVENT_PREFIX, Some(&choose))?;

        let mut found: Option<Event> = None;
        for (_, value) in &rows {
            match serde_json::from_slice::<Event>(value) {
                Ok(event) if event.id == event_id => {
                    found = Some(event);
                    break;
                }
                Ok(_) => continue,
                Err(err) => warn!(error = %err, "could not unmarshal event during mark_event scan"),
            }
        }

        let mut event = found.ok_or_else(|| BusError::EventNotFound(event_id.to_string()))?;

        let mut txn = self.store.begin(true)?;
        for candidate_status in [
            crate::model::STATUS_UNPROCESSED,
            crate::model::STATUS_PROCESSED,
            crate::model::STATUS_RETRY,
        ] {
            txn.delete(&key::event_key(&event.stream_id, candidate_status, event.created_at, &event.id))?;
        }
        event.status = status;
        let new_key = key::event_key(&event.stream_id, event.status, event.created_at, &event.id);
        let expires_at_ns = event.created_at.timestamp_nanos_opt().map(|t| t as u64 + DEFAULT_TTL_NS);
        txn.set(new_key, serde_json::to_vec(&event)?, expires_at_ns)?;
        txn.commit()?;

        Ok(())
    }

    /// Read-only: lists events at status `0` (or `2` when `retry`). Status
    /// is never advanced as a side effect of listing.
    #[instrument(skip(self))]
    pub fn process_events(&self, name: &str, retry: bool) -> Result<Vec<Event>> {
        let streams = self.streams.write();
        let stream = streams.get(name).ok_or_else(|| BusError::StreamNotFound(name.to_string()))?;
        let status =
            if retry { crate::model::STATUS_RETRY } else { crate::model::STATUS_UNPROCESSED };
        let rows = self.store.scan(&key::event_stream_status_prefix(&stream.id, status), None)?;
        Ok(decode_events_skipping_failures(rows))
    }
}

fn decode_events_skipping_failures(rows: Vec<(Vec<u8>, Vec<u8>)>) -> Vec<Event> {
    let mut events = Vec::with_capacity(rows.len());
    for (_, value) in rows {
        match serde_json::from_slice::<Event>(&value) {
            Ok(event) => events.push(event),
            Err(err) => warn!(error = %err, "could not unmarshal event"),
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventbus_storage::MemoryStore;

    fn bus() -> Bus {
        Bus::new(Arc::new(MemoryStore::open()))
    }

    fn body(json: &str) -> Box<RawValue> {
        RawValue::from_string(json.to_string()).unwrap()
    }

    #[test]
    fn create_stream_persists_and_indexes_by_name() {
        let bus = bus();
        let stream = bus.create_stream("s1").unwrap();
        assert_eq!(stream.name, "s1");
        assert_eq!(bus.get_stream_info("s1").unwrap().id, stream.id);
    }

    #[test]
    fn create_stream_rejects_duplicate_name() {
        let bus = bus();
        bus.create_stream("s1").unwrap();
        let err = bus.create_stream("s1").unwrap_err();
        assert_eq!(err.to_string(), "stream: 's1' already exists");
    }

    #[test]
    fn get_stream_info_reports_not_found() {
        let bus = bus();
        let err = bus.get_stream_info("missing").unwrap_err();
        assert_eq!(err.to_string(), "stream 'missing' not found");
    }

    #[test]
    fn write_event_then_list_round_trips_body_and_status() {
        let bus = bus();
        bus.create_stream("s1").unwrap();
        let written = bus.write_event("s1", body(r#"{"k":"v"}"#)).unwrap();
        assert_eq!(written.status, crate::model::STATUS_UNPROCESSED);

        let events = bus.get_stream_events("s1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, written.id);
        assert_eq!(events[0].body.get(), r#"{"k":"v"}"#);
    }

    #[test]
    fn write_event_reports_stream_not_found() {
        let bus = bus();
        let err = bus.write_event("missing", body("{}")).unwrap_err();
        assert_eq!(err.to_string(), "stream 'missing' not found");
    }

    #[test]
    fn mark_event_rotates_status_key() {
        let bus = bus();
        bus.create_stream("s1").unwrap();
        let event = bus.write_event("s1", body("{}")).unwrap();

        bus.mark_event(&event.id, crate::model::STATUS_PROCESSED).unwrap();

        let pending = bus.process_events("s1", false).unwrap();
        assert!(pending.is_empty());
        let events = bus.get_stream_events("s1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, crate::model::STATUS_PROCESSED);
    }

    #[test]
    fn mark_event_reports_not_found_for_unknown_id() {
        let bus = bus();
        let err = bus.mark_event("evt-id", 1).unwrap_err();
        assert_eq!(err.to_string(), "event 'evt-id' not found");
    }

    #[test]
    fn mark_event_rejects_invalid_status() {
        let bus = bus();
        bus.create_stream("s1").unwrap();
        let event = bus.write_event("s1", body("{}")).unwrap();
        let err = bus.mark_event(&event.id, 9).unwrap_err();
        assert_eq!(
            err.to_string(),
            "status must be one of: '0 - unprocessed', '1 - processed', '2 - retry'"
        );
    }

    #[test]
    fn process_events_is_read_only_and_scoped_to_status() {
        let bus = bus();
        bus.create_stream("s1").unwrap();
        let unprocessed = bus.write_event("s1", body("{}")).unwrap();
        let retried = bus.write_event("s1", body("{}")).unwrap();
        bus.mark_event(&retried.id, crate::model::STATUS_RETRY).unwrap();

        let pending = bus.process_events("s1", false).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, unprocessed.id);

        // calling again returns the same result: it did not auto-advance.
        let pending_again = bus.process_events("s1", false).unwrap();
        assert_eq!(pending_again.len(), 1);

        let retries = bus.process_events("s1", true).unwrap();
        assert_eq!(retries.len(), 1);
        assert_eq!(retries[0].id, retried.id);
    }

    #[test]
    fn process_events_reports_stream_not_found() {
        let bus = bus();
        let err = bus.process_events("missing", false).unwrap_err();
        assert_eq!(err.to_string(), "stream 'missing' not found");
    }

    #[test]
    fn delete_stream_cascades_to_its_events() {
        let bus = bus();
        let stream = bus.create_stream("s1").unwrap();
        bus.write_event("s1", body("{}")).unwrap();
        bus.write_event("s1", body("{}")).unwrap();

        bus.delete_stream("s1").unwrap();

        assert!(matches!(bus.get_stream_info("s1"), Err(BusError::StreamNotFound(_))));
        let leftover = bus.store.scan(&key::event_stream_prefix(&stream.id), None).unwrap();
        assert!(leftover.is_empty());
    }

    #[test]
    fn init_rebuilds_registry_from_store() {
        let store = Arc::new(MemoryStore::open());
        let bus = Bus::new(store.clone());
        bus.create_stream("s1").unwrap();

        let reopened = Bus::new(store);
        reopened.init().unwrap();
        assert_eq!(reopened.get_stream_info("s1").unwrap().name, "s1");
    }

    #[test]
    fn concurrent_create_stream_has_exactly_one_winner() {
        use std::thread;

        let bus = Arc::new(bus());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bus = Arc::clone(&bus);
                thread::spawn(move || bus.create_stream("x").is_ok())
            })
            .collect();

        let successes = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert_eq!(successes, 1);
    }
}

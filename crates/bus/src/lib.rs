// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

// Stream and event domain model plus the bus engine.
//
// The event lifecycle is encoded twice: once in the `status` field of the
// persisted JSON value, and once in the key each event is stored under.
// The key encoding turns "all pending events" into a bounded prefix scan
// instead of a filter over every event in a stream; `mark_event` keeps
// both encodings in sync by deleting the old key and writing a new one
// inside a single transaction.

mod engine;
mod error;
mod key;
mod model;

pub use engine::Bus;
pub use error::{BusError, Result};
pub use key::{EVENT_PREFIX, STREAM_PREFIX, event_stream_prefix, event_stream_status_prefix};
pub use model::{Event, STATUS_PROCESSED, STATUS_RETRY, STATUS_UNPROCESSED, Stream, validate_status};

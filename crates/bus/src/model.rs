// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

pub const STATUS_UNPROCESSED: u8 = 0;
pub const STATUS_PROCESSED: u8 = 1;
pub const STATUS_RETRY: u8 = 2;

/// A named, durable sequence of events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stream {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// An opaque JSON record appended to a stream.
///
/// `body` is kept as raw JSON: the bus never inspects event contents, only
/// routes them by id and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub stream_id: String,
    pub status: u8,
    pub created_at: DateTime<Utc>,
    pub body: Box<RawValue>,
}

/// Returns an error unless `status` is one of the three recognized values.
///
/// Message text is standardized (both quotes present, unlike some source
/// revisions of the service this was modeled on).
pub fn validate_status(status: u8) -> Result<(), crate::BusError> {
    match status {
        STATUS_UNPROCESSED | STATUS_PROCESSED | STATUS_RETRY => Ok(()),
        _ => Err(crate::BusError::InvalidStatus),
    }
}

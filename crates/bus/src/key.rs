// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use chrono::{DateTime, SecondsFormat, Utc};

pub fn stream_key(id: &str) -> Vec<u8> {
    format!("stream:{id}").into_bytes()
}

pub fn event_key(stream_id: &str, status: u8, created_at: DateTime<Utc>, id: &str) -> Vec<u8> {
    format!(
        "event:{stream_id}:{status}:{}:{id}",
        created_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    )
    .into_bytes()
}

pub fn event_stream_status_prefix(stream_id: &str, status: u8) -> Vec<u8> {
    format!("event:{stream_id}:{status}:").into_bytes()
}

pub fn event_stream_prefix(stream_id: &str) -> Vec<u8> {
    format!("event:{stream_id}:").into_bytes()
}

pub const STREAM_PREFIX: &[u8] = b"stream:";
pub const EVENT_PREFIX: &[u8] = b"event:";

/// The trailing `:{id}` segment of an event key, used by `mark_event` to
/// find a key belonging to a given event id without knowing its stream or
/// status ahead of time.
pub fn key_matches_event_id(key: &[u8], event_id: &str) -> bool {
    let suffix = format!(":{event_id}");
    key.ends_with(suffix.as_bytes())
}

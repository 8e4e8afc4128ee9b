// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

// Per-operation request body shapes.
//
// Each body type is both the `serde` deserialization target for the raw
// body and, via `RequiredFields`, the source of the `context.body` report
// sent back when a request that needs a body omits one. Declaring the
// shape once keeps the two from drifting apart, unlike the reflection
// the original service used to derive the same report at runtime.

use eventbus_type::{FieldSpec, RequiredFields};
use serde::Deserialize;
use serde_json::value::RawValue;

#[derive(Debug, Deserialize)]
pub struct StreamNameBody {
    pub stream_name: String,
}

impl RequiredFields for StreamNameBody {
    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::new("stream_name", "string", true)]
    }
}

#[derive(Debug, Deserialize)]
pub struct WriteEventBody {
    pub stream_name: String,
    pub event: Box<RawValue>,
}

impl RequiredFields for WriteEventBody {
    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::new("stream_name", "string", true), FieldSpec::new("event", "[]byte", true)]
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkEventBody {
    pub event_id: String,
    pub status: u8,
}

impl RequiredFields for MarkEventBody {
    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::new("event_id", "string", true), FieldSpec::new("status", "uint8", true)]
    }
}

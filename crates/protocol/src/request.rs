// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{ProtocolError, Result};

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub client_id: String,
    pub client_secret: String,
}

/// A decoded request line. `body` is kept raw until the router has picked
/// an operation and knows what shape to parse it into.
#[derive(Debug, Deserialize)]
pub struct Request {
    pub operation: String,
    #[serde(default)]
    pub body: Option<Box<RawValue>>,
    #[serde(default)]
    pub auth: Option<Auth>,
}

/// Decodes one newline-framed request line.
pub fn decode_request(line: &str) -> Result<Request> {
    serde_json::from_str(line).map_err(|_| ProtocolError::InvalidJson)
}

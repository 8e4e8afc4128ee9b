// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use eventbus_storage::StorageError;
use thiserror::Error;

/// Error produced by a bus operation. The `Display` text of every variant
/// that can reach a client is the exact wire reason string.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("stream: '{0}' already exists")]
    StreamAlreadyExists(String),

    #[error("stream '{0}' not found")]
    StreamNotFound(String),

    #[error("event '{0}' not found")]
    EventNotFound(String),

    #[error("status must be one of: '0 - unprocessed', '1 - processed', '2 - retry'")]
    InvalidStatus,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("could not unmarshal event: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BusError>;

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid json provided")]
    InvalidJson,
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

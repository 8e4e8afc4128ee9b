// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store is closed")]
    Closed,

    #[error("transaction is read-only")]
    ReadOnly,

    #[error("transaction already finished")]
    TransactionFinished,
}

pub type Result<T> = std::result::Result<T, StorageError>;

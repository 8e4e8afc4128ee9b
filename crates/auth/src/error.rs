// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthorized to make request")]
    Unauthorized,
}

pub type Result<T> = std::result::Result<T, AuthError>;

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("config must declare at least one entry under 'auth'")]
    EmptyAuth,
}

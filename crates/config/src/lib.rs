// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

// Loads the event bus server's YAML configuration file: the client
// credential table, logging options, and the bind/accept-deadline/store
// settings the binary hands to the connection server.

mod error;

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use eventbus_auth::ClientCredential;
use serde::Deserialize;

pub use error::ConfigError;

const DEFAULT_BIND: &str = "localhost:8080";
const DEFAULT_ACCEPT_DEADLINE_MS: u64 = 500;

fn default_logger_level() -> String {
    "debug".to_string()
}

fn default_logger_output() -> Vec<String> {
    vec!["stdout".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_logger_level")]
    pub level: String,
    #[serde(default = "default_logger_output")]
    pub output: Vec<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { level: default_logger_level(), output: default_logger_output() }
    }
}

/// The server's configuration file, deserialized from YAML.
///
/// `auth` is the only section with no usable default: a server with no
/// configured clients has no meaningful way to ever authenticate a
/// request, so [`FileConfig::load`] treats an empty table as fatal.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub auth: HashMap<String, ClientCredential>,
    #[serde(default)]
    pub logger: LoggerConfig,
    pub bind: Option<String>,
    pub accept_deadline_ms: Option<u64>,
    pub store_path: Option<String>,
}

impl FileConfig {
    /// Reads and parses `path`, then validates that at least one client
    /// credential is configured.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: FileConfig = serde_yaml::from_str(&contents)?;
        if config.auth.is_empty() {
            return Err(ConfigError::EmptyAuth);
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn accept_deadline(&self) -> Duration {
        Duration::from_millis(self.accept_deadline_ms.unwrap_or(DEFAULT_ACCEPT_DEADLINE_MS))
    }

    pub fn credentials(&self) -> Vec<ClientCredential> {
        self.auth.values().cloned().collect()
    }
}

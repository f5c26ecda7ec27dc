// Copyright 2026 The Airtime Voucher Service Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::env;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use voucher_util::LoggingConfig;

/// Error loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    FileIoError(String, String),
    ParseError(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::FileIoError(file, message) => {
                write!(f, "error reading config file {file}: {message}")
            }
            ConfigError::ParseError(file, message) => {
                write!(f, "error parsing config file {file}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top level service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// `sqlx` connection string, e.g. `sqlite://vouchers.db` or
    /// `sqlite::memory:` for tests.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Address the HTTP gateway binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Per-connection statement timeout, in seconds. No value disables it.
    #[serde(default)]
    pub statement_timeout_secs: Option<u64>,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_database_url() -> String {
    "sqlite://voucher_service.db".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_url: default_database_url(),
            bind_addr: default_bind_addr(),
            statement_timeout_secs: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Loads defaults, applies an optional TOML config file, then applies
    /// environment variable overrides (`VOUCHER_DATABASE_URL`,
    /// `VOUCHER_BIND_ADDR`, `VOUCHER_LOG_LEVEL`).
    pub fn load(config_file: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
        let mut config = match config_file {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    ConfigError::FileIoError(path.display().to_string(), e.to_string())
                })?;
                toml::from_str(&contents).map_err(|e| {
                    ConfigError::ParseError(path.display().to_string(), e.to_string())
                })?
            }
            None => ServiceConfig::default(),
        };

        if let Ok(url) = env::var("VOUCHER_DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(addr) = env::var("VOUCHER_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(level) = env::var("VOUCHER_LOG_LEVEL") {
            if let Ok(level) = level.parse() {
                config.logging.level = level;
            }
        }

        Ok(config)
    }
}

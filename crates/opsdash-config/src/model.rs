// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the opsdash backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level opsdash configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpsdashConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub server: ServerConfig,

    /// Backing database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Durable write queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Display name used in log output.
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_server_name() -> String {
    "opsdash".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Backing database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "opsdash.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Durable write queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Names of the queues opened at startup. Each name owns one snapshot file.
    #[serde(default = "default_queue_names")]
    pub names: Vec<String>,

    /// Cron expression driving flush cycles.
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Start with flushing paused. Statements are still accepted and persisted.
    #[serde(default)]
    pub paused: bool,

    /// Maximum number of statements claimed into one flush batch.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Maximum number of statements in flight at once during a flush.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-statement timeout in seconds. `0` disables the timeout.
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,

    /// Directory holding `<queue>.json` snapshots.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Directory receiving one diagnostic file per failed statement.
    #[serde(default = "default_failure_log_dir")]
    pub failure_log_dir: String,
}

impl QueueConfig {
    pub fn statement_timeout(&self) -> Option<Duration> {
        (self.statement_timeout_secs > 0).then(|| Duration::from_secs(self.statement_timeout_secs))
    }

    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_dir)
    }

    pub fn failure_log_path(&self) -> PathBuf {
        PathBuf::from(&self.failure_log_dir)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            names: default_queue_names(),
            schedule: default_schedule(),
            paused: false,
            max_batch_size: default_max_batch_size(),
            concurrency: default_concurrency(),
            statement_timeout_secs: default_statement_timeout_secs(),
            cache_dir: default_cache_dir(),
            failure_log_dir: default_failure_log_dir(),
        }
    }
}

fn default_queue_names() -> Vec<String> {
    vec!["dashboard".to_string()]
}

fn default_schedule() -> String {
    "* * * * *".to_string()
}

fn default_max_batch_size() -> usize {
    100_000
}

fn default_concurrency() -> usize {
    10
}

fn default_statement_timeout_secs() -> u64 {
    30
}

fn default_cache_dir() -> String {
    "cache".to_string()
}

fn default_failure_log_dir() -> String {
    "logs".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_defaults() {
        let queue = QueueConfig::default();
        assert_eq!(queue.names, vec!["dashboard"]);
        assert_eq!(queue.max_batch_size, 100_000);
        assert_eq!(queue.concurrency, 10);
        assert_eq!(queue.statement_timeout(), Some(Duration::from_secs(30)));
        assert!(!queue.paused);
    }

    #[test]
    fn zero_timeout_disables_statement_timeout() {
        let queue = QueueConfig {
            statement_timeout_secs: 0,
            ..QueueConfig::default()
        };
        assert_eq!(queue.statement_timeout(), None);
    }

    #[test]
    fn queue_section_rejects_unknown_keys() {
        let toml_str = r#"
[queue]
max_batch = 10
"#;
        assert!(toml::from_str::<OpsdashConfig>(toml_str).is_err());
    }
}

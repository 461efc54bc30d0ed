// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as a parseable cron schedule, filename-safe queue names and non-zero
//! batch limits.

use std::collections::HashSet;
use std::str::FromStr;

use crate::diagnostic::ConfigError;
use crate::model::OpsdashConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &OpsdashConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(validation(format!(
            "server.log_level `{}` must be one of {}",
            config.server.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty"));
    }

    let queue = &config.queue;

    if queue.names.is_empty() {
        errors.push(validation("queue.names must list at least one queue"));
    }

    // Queue names become snapshot file names.
    let mut seen = HashSet::new();
    for (i, name) in queue.names.iter().enumerate() {
        if !is_valid_queue_name(name) {
            errors.push(validation(format!(
                "queue.names[{i}] `{name}` must be non-empty and use only letters, digits, `_` or `-`"
            )));
        }
        if !seen.insert(name) {
            errors.push(validation(format!("duplicate queue name `{name}` in queue.names")));
        }
    }

    if let Err(e) = croner::Cron::from_str(&queue.schedule) {
        errors.push(validation(format!(
            "queue.schedule `{}` is not a valid cron expression: {e}",
            queue.schedule
        )));
    }

    if queue.max_batch_size == 0 {
        errors.push(validation("queue.max_batch_size must be at least 1"));
    }

    if queue.concurrency == 0 {
        errors.push(validation("queue.concurrency must be at least 1"));
    }

    if queue.cache_dir.trim().is_empty() {
        errors.push(validation("queue.cache_dir must not be empty"));
    }

    if queue.failure_log_dir.trim().is_empty() {
        errors.push(validation("queue.failure_log_dir must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Queue names are used verbatim as snapshot file stems.
pub fn is_valid_queue_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

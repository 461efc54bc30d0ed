// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./opsdash.toml` > `~/.config/opsdash/opsdash.toml` > `/etc/opsdash/opsdash.toml`
//! with environment variable overrides via `OPSDASH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::OpsdashConfig;

/// Config files in merge order (later overrides earlier).
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/opsdash/opsdash.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("opsdash/opsdash.toml"));
    }
    paths.push(PathBuf::from("opsdash.toml"));
    paths
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/opsdash/opsdash.toml` (system-wide)
/// 3. `~/.config/opsdash/opsdash.toml` (user XDG config)
/// 4. `./opsdash.toml` (local directory)
/// 5. `OPSDASH_*` environment variables
pub fn load_config() -> Result<OpsdashConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<OpsdashConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OpsdashConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OpsdashConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OpsdashConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    config_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(OpsdashConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Map `OPSDASH_<SECTION>_<KEY>` onto `<section>.<key>`.
///
/// Uses `Env::map()` rather than `Env::split("_")`: keys such as
/// `max_batch_size` contain underscores, so `OPSDASH_QUEUE_MAX_BATCH_SIZE`
/// must become `queue.max_batch_size`, not `queue.max.batch.size`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("OPSDASH_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    ["server_", "storage_", "queue_"]
        .iter()
        .find_map(|prefix| {
            key.strip_prefix(prefix)
                .map(|rest| format!("{}.{rest}", prefix.trim_end_matches('_')))
        })
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("queue_max_batch_size"), "queue.max_batch_size");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("server_log_level"), "server.log_level");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn local_file_is_merged_last() {
        let paths = config_paths();
        assert_eq!(paths.first().unwrap(), &PathBuf::from("/etc/opsdash/opsdash.toml"));
        assert_eq!(paths.last().unwrap(), &PathBuf::from("opsdash.toml"));
    }
}

// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use opsdash_config::model::StorageConfig;
use opsdash_core::OpsdashError;
use tracing::{debug, info};

use crate::migrations;

/// Convert a tokio-rusqlite error into `OpsdashError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> OpsdashError {
    OpsdashError::Storage {
        source: Box::new(e),
    }
}

fn storage_err(e: rusqlite::Error) -> OpsdashError {
    OpsdashError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the dashboard database.
///
/// Wraps the single `tokio_rusqlite::Connection` every write goes through.
/// The path must name a file: `:memory:` would give the migration pass and
/// the writer two different databases.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply PRAGMAs and
    /// run pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, OpsdashError> {
        let owned = path.to_string();
        tokio::task::spawn_blocking(move || prepare(&owned, wal_mode))
            .await
            .map_err(|e| OpsdashError::Internal(format!("database setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| OpsdashError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        })
        .await
        .map_err(map_tr_err)?;

        info!(path, wal_mode, "database opened");
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    /// Open the database described by the storage section of the config.
    pub async fn open_with(config: &StorageConfig) -> Result<Self, OpsdashError> {
        Self::open(&config.database_path, config.wal_mode).await
    }

    /// The shared writer connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Checkpoint the WAL and close the writer connection.
    pub async fn close(self) -> Result<(), OpsdashError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(|e| OpsdashError::Storage {
            source: Box::new(e),
        })?;
        debug!(path = %self.path, "database closed");
        Ok(())
    }
}

/// Journal mode and migrations run on a short-lived blocking connection so
/// the refinery runner gets the `&mut rusqlite::Connection` it needs.
fn prepare(path: &str, wal_mode: bool) -> Result<(), OpsdashError> {
    let mut conn = rusqlite::Connection::open(path).map_err(storage_err)?;
    if wal_mode {
        let mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(storage_err)?;
        debug!(path, mode = %mode, "journal mode set");
    }
    migrations::run_migrations(&mut conn)
}

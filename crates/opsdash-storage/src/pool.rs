// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-writer connection pool for SQLite.
//!
//! All writes are serialized through `tokio-rusqlite`'s single background
//! thread. Every connection handed out by [`SqlitePool`] is a clone of the
//! [`Database`] writer, so the statements of a flush batch queue up on that
//! thread in the order they are issued.
//!
//! **Do NOT create additional Connection instances for writes.**

use std::os::raw::c_int;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use opsdash_core::{ConnectionPool, HealthStatus, OpsdashError, PooledConnection, TxStage};
use rusqlite::ErrorCode;
use tracing::{debug, warn};

use crate::database::{map_tr_err, Database};

/// SQLite-backed [`ConnectionPool`].
#[derive(Clone)]
pub struct SqlitePool {
    conn: tokio_rusqlite::Connection,
    checked_out: Arc<AtomicUsize>,
}

impl SqlitePool {
    pub fn new(db: &Database) -> Self {
        Self {
            conn: db.connection().clone(),
            checked_out: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of connections acquired and not yet released.
    pub fn checked_out(&self) -> usize {
        self.checked_out.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ConnectionPool for SqlitePool {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn acquire(&self) -> Result<Box<dyn PooledConnection>, OpsdashError> {
        let in_use = self.checked_out.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(in_use, "sqlite connection acquired");
        Ok(Box::new(SqliteConnection {
            conn: self.conn.clone(),
            checked_out: Arc::clone(&self.checked_out),
        }))
    }

    async fn health_check(&self) -> Result<HealthStatus, OpsdashError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

struct SqliteConnection {
    conn: tokio_rusqlite::Connection,
    checked_out: Arc<AtomicUsize>,
}

#[async_trait]
impl PooledConnection for SqliteConnection {
    async fn run_in_transaction(
        &self,
        statement: &str,
        timeout: Option<Duration>,
    ) -> Result<(), OpsdashError> {
        let statement = statement.to_string();
        // The outer error is the connection itself going away; the inner one
        // is the statement's own failure.
        let outcome = self
            .conn
            .call(move |conn| -> Result<Result<(), UnitError>, rusqlite::Error> {
                Ok(run_unit(conn, &statement, timeout))
            })
            .await
            .map_err(map_tr_err)?;

        outcome.map_err(|e| match e {
            UnitError::Failed(stage, source) => OpsdashError::Transaction {
                stage,
                source: Box::new(source),
            },
            UnitError::TimedOut(duration) => OpsdashError::Timeout { duration },
        })
    }

    fn release(self: Box<Self>) {
        let in_use = self.checked_out.fetch_sub(1, Ordering::AcqRel) - 1;
        debug!(in_use, "sqlite connection released");
    }
}

#[derive(Debug)]
enum UnitError {
    Failed(TxStage, rusqlite::Error),
    /// Interrupted at the deadline and rolled back.
    TimedOut(Duration),
}

/// VM instructions between deadline checks.
const PROGRESS_OPS: c_int = 1_000;

/// Begin, execute and commit one statement; roll back if it fails.
///
/// `execute_batch` lets one queued statement carry several SQL commands, as
/// the view update statements do. The deadline only covers execution: the
/// progress handler is removed before `COMMIT`, so an interrupted unit is
/// always rolled back and a unit that reached commit is never reported as
/// timed out.
fn run_unit(
    conn: &mut rusqlite::Connection,
    statement: &str,
    timeout: Option<Duration>,
) -> Result<(), UnitError> {
    let tx = conn
        .transaction()
        .map_err(|e| UnitError::Failed(TxStage::Begin, e))?;

    if let Some(limit) = timeout {
        let deadline = Instant::now() + limit;
        tx.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));
    }
    let executed = tx.execute_batch(statement);
    if timeout.is_some() {
        tx.progress_handler(0, None::<fn() -> bool>);
    }

    if let Err(e) = executed {
        if let Err(rollback) = tx.rollback() {
            warn!(error = %rollback, "rollback failed after statement error");
        }
        return Err(match timeout {
            Some(limit) if e.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) => {
                UnitError::TimedOut(limit)
            }
            _ => UnitError::Failed(TxStage::Execute, e),
        });
    }
    tx.commit().map_err(|e| UnitError::Failed(TxStage::Commit, e))
}

// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch execution over one pooled connection.
//!
//! [`BatchRunner::run`] acquires a single connection, issues every statement
//! of a batch as its own transaction with at most `concurrency` in flight,
//! and releases the connection exactly once, also when the run is dropped
//! mid-batch. The first failure halts the batch: statements that have not
//! started yet are not issued. Statement timeouts are enforced by the
//! connection, which rolls a timed-out statement back before reporting it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{StreamExt, stream};
use opsdash_core::{ConnectionPool, FailureSink, OpsdashError, PooledConnection, StatementFailure};
use tracing::{debug, warn};

/// All statements of a batch either committed or were skipped as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub committed: usize,
    pub skipped: usize,
}

/// A batch stopped at its first failing statement.
#[derive(Debug)]
pub struct BatchFailure {
    /// Lowest batch position that failed. 0 when no connection was acquired.
    pub resume_index: usize,
    /// Batch positions that still need to run, ascending: every unit that
    /// failed or never started. Units that committed, including those past
    /// `resume_index` that finished before the halt, are not included.
    pub retry: Vec<usize>,
    pub error: OpsdashError,
}

/// Releases its connection when dropped.
struct Lease(Option<Box<dyn PooledConnection>>);

impl Lease {
    fn conn(&self) -> Option<&dyn PooledConnection> {
        self.0.as_deref()
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(conn) = self.0.take() {
            conn.release();
        }
    }
}

#[derive(Debug)]
enum UnitOutcome {
    Committed,
    Skipped,
    /// Not started because an earlier unit had already failed.
    Halted,
    Failed(OpsdashError),
}

impl UnitOutcome {
    fn needs_retry(&self) -> bool {
        matches!(self, UnitOutcome::Failed(_) | UnitOutcome::Halted)
    }
}

/// Runs claimed batches against a [`ConnectionPool`].
pub struct BatchRunner {
    pool: Arc<dyn ConnectionPool>,
    failures: Arc<dyn FailureSink>,
    concurrency: usize,
    statement_timeout: Option<Duration>,
}

impl BatchRunner {
    pub fn new(
        pool: Arc<dyn ConnectionPool>,
        failures: Arc<dyn FailureSink>,
        concurrency: usize,
        statement_timeout: Option<Duration>,
    ) -> Self {
        Self {
            pool,
            failures,
            concurrency: concurrency.max(1),
            statement_timeout,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `statements` for `queue`.
    pub async fn run(&self, queue: &str, statements: &[String]) -> Result<BatchReport, BatchFailure> {
        let conn = match self.pool.acquire().await {
            Ok(conn) => conn,
            Err(error) => {
                warn!(queue, pool = self.pool.name(), error = %error, "could not acquire connection");
                return Err(BatchFailure {
                    resume_index: 0,
                    retry: (0..statements.len()).collect(),
                    error,
                });
            }
        };

        let lease = Lease(Some(conn));
        let Some(unit_conn) = lease.conn() else {
            return Err(BatchFailure {
                resume_index: 0,
                retry: (0..statements.len()).collect(),
                error: OpsdashError::Internal("connection lease is empty".to_string()),
            });
        };

        let halted = AtomicBool::new(false);
        let outcomes: Vec<UnitOutcome> = stream::iter(0..statements.len())
            .map(|index| self.run_unit(unit_conn, &halted, queue, index, &statements[index]))
            .buffered(self.concurrency)
            .collect()
            .await;

        drop(lease);
        summarize(outcomes)
    }

    async fn run_unit(
        &self,
        conn: &dyn PooledConnection,
        halted: &AtomicBool,
        queue: &str,
        index: usize,
        statement: &str,
    ) -> UnitOutcome {
        if statement.trim().is_empty() {
            debug!(queue, index, "skipping empty statement");
            return UnitOutcome::Skipped;
        }
        if halted.load(Ordering::Acquire) {
            return UnitOutcome::Halted;
        }

        match conn.run_in_transaction(statement, self.statement_timeout).await {
            Ok(()) => UnitOutcome::Committed,
            Err(error) => {
                halted.store(true, Ordering::Release);
                self.failures
                    .record(&StatementFailure {
                        queue: queue.to_string(),
                        index,
                        statement: statement.to_string(),
                        stage: error.stage(),
                        error: error.to_string(),
                    })
                    .await;
                UnitOutcome::Failed(error)
            }
        }
    }
}

/// Fold per-unit outcomes into the batch result. The lowest failing
/// position wins when several units failed concurrently.
fn summarize(outcomes: Vec<UnitOutcome>) -> Result<BatchReport, BatchFailure> {
    let Some(resume_index) = outcomes
        .iter()
        .position(|o| matches!(o, UnitOutcome::Failed(_)))
    else {
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o, UnitOutcome::Skipped))
            .count();
        return Ok(BatchReport {
            committed: outcomes.len() - skipped,
            skipped,
        });
    };

    let retry = outcomes
        .iter()
        .enumerate()
        .filter(|(_, o)| o.needs_retry())
        .map(|(i, _)| i)
        .collect();

    let error = match outcomes.into_iter().nth(resume_index) {
        Some(UnitOutcome::Failed(error)) => error,
        _ => OpsdashError::Internal(format!("no failure recorded at index {resume_index}")),
    };

    Err(BatchFailure {
        resume_index,
        retry,
        error,
    })
}

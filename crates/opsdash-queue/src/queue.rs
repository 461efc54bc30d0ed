// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The write queue: enqueue, flush cycles, snapshot and restore.
//!
//! Each queue holds two lists. `pending` collects accepted statements in
//! arrival order; `processing` holds the batch claimed by the current or
//! last failed flush cycle. Two flags guard the async operations:
//!
//! - `in_progress`: at most one flush cycle runs at a time. A trigger that
//!   finds it set returns [`CycleOutcome::AlreadyRunning`].
//! - `saving_snapshot`: at most one snapshot write runs at a time. A persist
//!   that finds it set is skipped; the next cycle writes a fresher one.
//!
//! The lists sit behind a synchronous mutex that is never held across an
//! await point, so [`WriteQueue::enqueue`] never waits on a flush.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use opsdash_config::model::QueueConfig;
use opsdash_core::{ConnectionPool, FailureSink, OpsdashError, QueueSnapshot, SnapshotStore};
use tracing::{debug, info, warn};

use crate::runner::BatchRunner;
use crate::state::QueueState;

/// Largest batch a single cycle claims unless configured otherwise.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100_000;

/// Statements in flight at once within a batch unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Tunables for one queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSettings {
    pub max_batch_size: usize,
    pub concurrency: usize,
    pub statement_timeout: Option<Duration>,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            statement_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl From<&QueueConfig> for QueueSettings {
    fn from(config: &QueueConfig) -> Self {
        Self {
            max_batch_size: config.max_batch_size,
            concurrency: config.concurrency,
            statement_timeout: config.statement_timeout(),
        }
    }
}

/// Result of [`WriteQueue::trigger_cycle`].
#[derive(Debug)]
pub enum CycleOutcome {
    /// The claimed batch committed. `executed` counts committed statements;
    /// 0 when there was nothing to flush.
    Success { executed: usize },
    /// Another cycle was already flushing this queue. Nothing was claimed.
    AlreadyRunning,
    /// The batch failed at `resume_index`. `remaining` statements stay in
    /// processing and run first next cycle.
    PartialFailure {
        resume_index: usize,
        remaining: usize,
        error: OpsdashError,
    },
}

impl CycleOutcome {
    /// Whether the cycle claimed and ran a batch, successfully or not.
    pub fn ran(&self) -> bool {
        !matches!(self, CycleOutcome::AlreadyRunning)
    }
}

/// Result of [`WriteQueue::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved { entries: usize },
    /// Another snapshot write was in flight.
    Skipped,
}

/// Clears its flag on drop, so a flag set by [`FlagGuard::acquire`] is
/// released on every exit path.
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A named, durable queue of SQL write statements.
pub struct WriteQueue {
    name: String,
    state: Mutex<QueueState>,
    in_progress: AtomicBool,
    saving_snapshot: AtomicBool,
    max_batch_size: usize,
    runner: BatchRunner,
    snapshots: Arc<dyn SnapshotStore>,
}

impl WriteQueue {
    /// Create an empty queue. Call [`WriteQueue::restore`] to reload its
    /// snapshot, or use [`WriteQueue::open`] which does both.
    pub fn new(
        name: impl Into<String>,
        settings: QueueSettings,
        pool: Arc<dyn ConnectionPool>,
        snapshots: Arc<dyn SnapshotStore>,
        failures: Arc<dyn FailureSink>,
    ) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(QueueState::default()),
            in_progress: AtomicBool::new(false),
            saving_snapshot: AtomicBool::new(false),
            max_batch_size: settings.max_batch_size.max(1),
            runner: BatchRunner::new(
                pool,
                failures,
                settings.concurrency,
                settings.statement_timeout,
            ),
            snapshots,
        }
    }

    /// Create a queue and restore its last snapshot.
    pub async fn open(
        name: impl Into<String>,
        settings: QueueSettings,
        pool: Arc<dyn ConnectionPool>,
        snapshots: Arc<dyn SnapshotStore>,
        failures: Arc<dyn FailureSink>,
    ) -> Self {
        let queue = Self::new(name, settings, pool, snapshots, failures);
        queue.restore().await;
        queue
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept a statement for asynchronous execution.
    ///
    /// Returns `false` and leaves the queue unchanged when the statement is
    /// empty or whitespace. Never blocks on a running flush.
    pub fn enqueue(&self, statement: impl Into<String>) -> bool {
        self.offer(Some(statement.into()))
    }

    fn offer(&self, statement: Option<String>) -> bool {
        match statement {
            Some(statement) if !statement.trim().is_empty() => {
                self.lock().push(statement);
                true
            }
            _ => {
                debug!(queue = %self.name, "rejected empty statement");
                false
            }
        }
    }

    /// Reload the last snapshot by replaying it through [`Self::offer`]:
    /// the previously claimed batch first, then the backlog.
    ///
    /// A missing snapshot leaves the queue empty. An unreadable one is
    /// logged and the queue starts empty. Returns the number of statements
    /// restored.
    pub async fn restore(&self) -> usize {
        let snapshot = match self.snapshots.load(&self.name).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!(queue = %self.name, "no snapshot to restore");
                return 0;
            }
            Err(e) => {
                warn!(queue = %self.name, error = %e, "snapshot unreadable, starting empty");
                return 0;
            }
        };

        let entries = snapshot.len();
        let mut restored = 0;
        for statement in snapshot.replay_order() {
            if self.offer(statement) {
                restored += 1;
            }
        }
        info!(queue = %self.name, restored, dropped = entries - restored, "queue restored from snapshot");
        restored
    }

    /// Run one flush cycle.
    ///
    /// Claims a batch (the leftover of a failed cycle, or up to
    /// `max_batch_size` pending statements) and runs it. On success the
    /// batch is dropped; on failure only the statements that did not commit
    /// stay in processing.
    pub async fn trigger_cycle(&self) -> CycleOutcome {
        let Some(_flushing) = FlagGuard::acquire(&self.in_progress) else {
            debug!(queue = %self.name, "flush already in progress");
            return CycleOutcome::AlreadyRunning;
        };

        let batch = self.lock().claim(self.max_batch_size);
        if batch.is_empty() {
            debug!(queue = %self.name, "nothing to flush");
            return CycleOutcome::Success { executed: 0 };
        }

        let started = Instant::now();
        debug!(queue = %self.name, statements = batch.len(), "flush started");

        match self.runner.run(&self.name, &batch).await {
            Ok(report) => {
                self.lock().complete();
                info!(
                    queue = %self.name,
                    executed = report.committed,
                    skipped = report.skipped,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "flush complete"
                );
                CycleOutcome::Success {
                    executed: report.committed,
                }
            }
            Err(failure) => {
                let remaining = {
                    let mut state = self.lock();
                    state.retain(failure.resume_index, &failure.retry);
                    state.processing().len()
                };
                warn!(
                    queue = %self.name,
                    resume_index = failure.resume_index,
                    remaining,
                    error = %failure.error,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "flush stopped at failing statement"
                );
                CycleOutcome::PartialFailure {
                    resume_index: failure.resume_index,
                    remaining,
                    error: failure.error,
                }
            }
        }
    }

    /// Write the current contents to the snapshot store.
    ///
    /// Skipped when another persist is in flight. A failed write is logged
    /// and returned; the in-memory queue stays authoritative.
    pub async fn persist(&self) -> Result<PersistOutcome, OpsdashError> {
        let Some(_saving) = FlagGuard::acquire(&self.saving_snapshot) else {
            debug!(queue = %self.name, "snapshot already being written");
            return Ok(PersistOutcome::Skipped);
        };

        let snapshot = self.snapshot();
        let entries = snapshot.len();
        match self.snapshots.save(&self.name, &snapshot).await {
            Ok(()) => Ok(PersistOutcome::Saved { entries }),
            Err(e) => {
                warn!(queue = %self.name, error = %e, "snapshot write failed");
                Err(e)
            }
        }
    }

    /// Current contents in snapshot form.
    pub fn snapshot(&self) -> QueueSnapshot {
        self.lock().snapshot()
    }

    /// Pending statements, oldest first.
    pub fn pending(&self) -> Vec<String> {
        self.lock().pending()
    }

    /// The claimed batch.
    pub fn processing(&self) -> Vec<String> {
        self.lock().processing().to_vec()
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending_len()
    }

    pub fn processing_len(&self) -> usize {
        self.lock().processing().len()
    }

    /// Position where the last cycle failed; cleared by a successful cycle.
    pub fn error_index(&self) -> Option<usize> {
        self.lock().error_index()
    }

    pub fn is_flushing(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

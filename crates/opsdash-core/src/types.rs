// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the write queue, its ports and the scheduler.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by connection pool health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Backend is fully operational.
    Healthy,
    /// Backend is operational but experiencing issues.
    Degraded(String),
    /// Backend is not operational.
    Unhealthy(String),
}

/// The stage of a per-statement transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TxStage {
    Begin,
    Execute,
    Commit,
}

/// Serialized form of a write queue, written after every flush cycle.
///
/// Entries are optional so that snapshots containing `null` entries still
/// load; those entries are dropped when replayed through `enqueue`. The
/// `queries` / `process_queries` aliases accept snapshots written by the
/// previous dashboard backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Statements not yet claimed by a flush, oldest first.
    #[serde(default, alias = "queries")]
    pub pending: Vec<Option<String>>,

    /// Statements claimed by the last flush and not yet committed.
    #[serde(default, alias = "process_queries")]
    pub processing: Vec<Option<String>>,
}

impl QueueSnapshot {
    /// Build a snapshot from the in-memory queue contents.
    pub fn new(pending: &[String], processing: &[String]) -> Self {
        Self {
            pending: pending.iter().cloned().map(Some).collect(),
            processing: processing.iter().cloned().map(Some).collect(),
        }
    }

    /// Entries in replay order: the claimed batch first, then the backlog.
    pub fn replay_order(self) -> impl Iterator<Item = Option<String>> {
        self.processing.into_iter().chain(self.pending)
    }

    /// Total number of entries, including `null` ones.
    pub fn len(&self) -> usize {
        self.pending.len() + self.processing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Diagnostic record for a statement that failed during a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFailure {
    /// Queue the statement belonged to.
    pub queue: String,
    /// Position of the statement in the flushed batch.
    pub index: usize,
    /// The statement text.
    pub statement: String,
    /// Transaction stage that failed; `None` for timeouts and connection errors.
    pub stage: Option<TxStage>,
    /// Rendered error message.
    pub error: String,
}

// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron loop that drives flush cycles for every open queue.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use croner::Cron;
use opsdash_config::model::QueueConfig;
use opsdash_core::OpsdashError;
use opsdash_queue::{CycleOutcome, QueueRegistry, WriteQueue};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::flags::RuntimeFlags;

/// What a single firing did.
#[derive(Debug)]
pub enum TickOutcome {
    /// The server is shutting down; nothing was started.
    Stopped,
    /// Flushing is paused; nothing was started.
    Paused,
    /// One flush-and-persist task was spawned per open queue.
    Fired(Vec<JoinHandle<CycleOutcome>>),
}

/// Run one flush cycle on `queue`, then snapshot it.
///
/// The snapshot is written after both successful and failed cycles. A
/// trigger that found the queue already flushing writes nothing; the cycle
/// in flight will persist when it finishes.
pub async fn flush_and_persist(queue: Arc<WriteQueue>) -> CycleOutcome {
    let outcome = queue.trigger_cycle().await;
    if outcome.ran() {
        // Failures are logged by the queue.
        let _ = queue.persist().await;
    } else {
        debug!(queue = queue.name(), "flush skipped, previous cycle still running");
    }
    outcome
}

pub struct QueueScheduler {
    schedule: Cron,
    expression: String,
    registry: Arc<QueueRegistry>,
    flags: Arc<RuntimeFlags>,
}

impl QueueScheduler {
    pub fn new(
        expression: &str,
        registry: Arc<QueueRegistry>,
        flags: Arc<RuntimeFlags>,
    ) -> Result<Self, OpsdashError> {
        let schedule = Cron::from_str(expression).map_err(|e| {
            OpsdashError::Config(format!("invalid flush schedule `{expression}`: {e}"))
        })?;
        Ok(Self {
            schedule,
            expression: expression.to_string(),
            registry,
            flags,
        })
    }

    pub fn from_config(
        config: &QueueConfig,
        registry: Arc<QueueRegistry>,
        flags: Arc<RuntimeFlags>,
    ) -> Result<Self, OpsdashError> {
        Self::new(&config.schedule, registry, flags)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The first firing strictly after `after`.
    pub fn next_fire(&self, after: &DateTime<Utc>) -> Result<DateTime<Utc>, OpsdashError> {
        self.schedule
            .find_next_occurrence(after, false)
            .map_err(|e| OpsdashError::Internal(format!("no next firing for `{}`: {e}", self.expression)))
    }

    /// Handle one firing.
    pub fn tick(&self) -> TickOutcome {
        if !self.flags.is_running() {
            return TickOutcome::Stopped;
        }
        if self.flags.is_paused() {
            debug!("flushing paused");
            return TickOutcome::Paused;
        }

        let handles = self
            .registry
            .queues()
            .into_iter()
            .map(|queue| tokio::spawn(flush_and_persist(queue)))
            .collect();
        TickOutcome::Fired(handles)
    }

    /// Fire on schedule until `cancel` is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(schedule = %self.expression, "flush scheduler started");

        loop {
            let now = Utc::now();
            let next = match self.next_fire(&now) {
                Ok(next) => next,
                Err(e) => {
                    warn!(error = %e, "flush scheduler stopping");
                    break;
                }
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let TickOutcome::Fired(handles) = self.tick() {
                        debug!(queues = handles.len(), "flush cycles started");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("flush scheduler shutting down");
                    break;
                }
            }
        }
    }
}

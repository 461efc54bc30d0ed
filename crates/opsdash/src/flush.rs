// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdash flush` command implementation.
//!
//! Opens the backend without the scheduler, runs one flush cycle on each
//! selected queue, and writes the snapshots back. Meant for draining queues
//! while the server is stopped.

use opsdash_config::model::OpsdashConfig;
use opsdash_core::OpsdashError;
use opsdash_cron::flush_and_persist;
use opsdash_queue::CycleOutcome;

use crate::serve::Backend;

/// Flush `only` (or every configured queue) once. Prints one line per queue.
pub async fn run_flush(config: &OpsdashConfig, only: Option<&str>) -> Result<(), OpsdashError> {
    if let Some(name) = only
        && !config.queue.names.iter().any(|n| n == name)
    {
        return Err(OpsdashError::Config(format!(
            "queue `{name}` is not configured (known: {})",
            config.queue.names.join(", ")
        )));
    }

    let backend = Backend::open(config).await?;
    let mut failed = 0;
    for queue in backend.registry.queues() {
        if only.is_some_and(|name| name != queue.name()) {
            continue;
        }
        let outcome = flush_and_persist(queue.clone()).await;
        if matches!(outcome, CycleOutcome::PartialFailure { .. }) {
            failed += 1;
        }
        println!("{}", describe(queue.name(), &outcome, queue.pending_len()));
    }
    backend.close().await?;

    if failed > 0 {
        return Err(OpsdashError::Internal(format!(
            "{failed} queue(s) stopped at a failing statement; see the failure log"
        )));
    }
    Ok(())
}

fn describe(name: &str, outcome: &CycleOutcome, pending: usize) -> String {
    match outcome {
        CycleOutcome::Success { executed } => {
            format!("{name}: {executed} executed, {pending} still pending")
        }
        CycleOutcome::AlreadyRunning => format!("{name}: already flushing"),
        CycleOutcome::PartialFailure {
            resume_index,
            remaining,
            error,
        } => format!("{name}: stopped at statement {resume_index} ({error}), {remaining} to retry"),
    }
}

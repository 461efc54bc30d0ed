// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable write queue for dashboard SQL statements.
//!
//! Producers hand fully formed SQL statements to a [`WriteQueue`] and return
//! immediately. A flush cycle claims a bounded batch, runs every statement in
//! its own transaction over one pooled connection with bounded parallelism,
//! and keeps whatever did not commit for the next cycle. The queue contents
//! are snapshotted after each cycle and replayed on startup, so queued work
//! survives a restart.
//!
//! [`QueueRegistry`] owns the named queues of one process.

pub mod queue;
pub mod registry;
pub mod runner;
mod state;

pub use queue::{CycleOutcome, PersistOutcome, QueueSettings, WriteQueue};
pub use registry::QueueRegistry;
pub use runner::{BatchFailure, BatchReport, BatchRunner};

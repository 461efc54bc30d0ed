// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron scheduling for write queue flushes.
//!
//! [`QueueScheduler`] fires on a cron schedule and, while the server is
//! running and not paused, starts a flush cycle on every open queue followed
//! by a snapshot write. Firings never wait for earlier cycles; a queue that
//! is still flushing reports `AlreadyRunning` and is left alone.

pub mod flags;
pub mod scheduler;

pub use flags::RuntimeFlags;
pub use scheduler::{QueueScheduler, TickOutcome, flush_and_persist};

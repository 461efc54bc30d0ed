// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for opsdash tests.
//!
//! Provides in-memory implementations of the core ports for fast,
//! deterministic tests without a database or filesystem.
//!
//! # Components
//!
//! - [`MockPool`] - scripted connection pool recording every statement
//! - [`MemorySnapshotStore`] - in-memory snapshot store with injectable failures
//! - [`RecordingFailureSink`] - captures failure records

pub mod gate;
pub mod mock_pool;
pub mod recording;
pub mod snapshot;

pub use gate::Gate;
pub use mock_pool::MockPool;
pub use recording::RecordingFailureSink;
pub use snapshot::MemorySnapshotStore;

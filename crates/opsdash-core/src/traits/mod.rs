// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port traits the write queue is built against.
//!
//! All ports use `#[async_trait]` for dynamic dispatch compatibility, so the
//! queue can hold them as `Arc<dyn ...>` and tests can swap in mocks.

pub mod failure;
pub mod pool;
pub mod snapshot;

pub use failure::FailureSink;
pub use pool::{ConnectionPool, PooledConnection};
pub use snapshot::SnapshotStore;

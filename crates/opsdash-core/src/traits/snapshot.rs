// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot persistence port for write queues.

use async_trait::async_trait;

use crate::error::OpsdashError;
use crate::types::QueueSnapshot;

/// Durable storage for queue snapshots, keyed by queue name.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    /// Loads the last snapshot for `queue`, or `None` if none was ever saved.
    async fn load(&self, queue: &str) -> Result<Option<QueueSnapshot>, OpsdashError>;

    /// Replaces the snapshot for `queue`.
    ///
    /// Must be atomic: a reader never observes a partially written snapshot,
    /// and an interrupted save leaves the previous snapshot intact.
    async fn save(&self, queue: &str, snapshot: &QueueSnapshot) -> Result<(), OpsdashError>;
}

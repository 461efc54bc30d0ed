// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pooled transactional connection port.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::OpsdashError;
use crate::types::HealthStatus;

/// A source of transactional connections to the backing store.
#[async_trait]
pub trait ConnectionPool: Send + Sync + 'static {
    /// Returns the human-readable name of this backend.
    fn name(&self) -> &str;

    /// Acquires a connection. The caller must hand it back with
    /// [`PooledConnection::release`] exactly once.
    async fn acquire(&self) -> Result<Box<dyn PooledConnection>, OpsdashError>;

    /// Performs a health check and returns the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, OpsdashError>;
}

/// A connection checked out of a [`ConnectionPool`].
///
/// One connection is shared by every statement of a flush batch, and several
/// statements may be in flight on it at once. Implementations therefore run
/// `begin / execute / commit` as one indivisible unit per call.
#[async_trait]
pub trait PooledConnection: Send + Sync {
    /// Runs `statement` inside its own transaction.
    ///
    /// On execute failure the transaction is rolled back. Failures are
    /// reported as [`OpsdashError::Transaction`] carrying the failed stage.
    ///
    /// When `timeout` elapses the backend aborts the statement and rolls it
    /// back before returning [`OpsdashError::Timeout`]. A statement reported
    /// as timed out must never commit.
    async fn run_in_transaction(
        &self,
        statement: &str,
        timeout: Option<Duration>,
    ) -> Result<(), OpsdashError>;

    /// Returns the connection to its pool. Synchronous so it can run from a
    /// drop guard.
    fn release(self: Box<Self>);
}

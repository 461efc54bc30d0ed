// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic sink for statements that fail during a flush.

use async_trait::async_trait;

use crate::types::StatementFailure;

/// Receives a record for every statement that fails during a flush.
///
/// Recording is best-effort and must not fail the flush.
#[async_trait]
pub trait FailureSink: Send + Sync + 'static {
    async fn record(&self, failure: &StatementFailure);
}

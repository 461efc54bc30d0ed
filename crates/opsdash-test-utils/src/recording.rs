// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure sink that keeps every record in memory.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use opsdash_core::{FailureSink, StatementFailure};

#[derive(Clone, Default)]
pub struct RecordingFailureSink {
    records: Arc<Mutex<Vec<StatementFailure>>>,
}

impl RecordingFailureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded failures, in the order they were reported.
    pub fn records(&self) -> Vec<StatementFailure> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FailureSink for RecordingFailureSink {
    async fn record(&self, failure: &StatementFailure) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(failure.clone());
    }
}

// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the opsdash backend.

use thiserror::Error;

use crate::types::TxStage;

/// The primary error type used across the port traits and the write queue.
#[derive(Debug, Error)]
pub enum OpsdashError {
    /// Configuration errors (invalid TOML, bad schedule, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection, migration, pool exhaustion).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Reading or writing a queue snapshot failed.
    #[error("snapshot error for queue `{queue}`: {source}")]
    Snapshot {
        queue: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A statement's transaction failed at the given stage and was rolled back.
    #[error("transaction failed at {stage}: {source}")]
    Transaction {
        stage: TxStage,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OpsdashError {
    /// The transaction stage that failed, for transaction errors.
    pub fn stage(&self) -> Option<TxStage> {
        match self {
            OpsdashError::Transaction { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the opsdash backend.
//!
//! This crate provides the error type, the port traits the write queue is
//! built against (connection pool, snapshot store, failure sink), and the
//! common types shared between the queue, its storage backends and the
//! scheduler.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::OpsdashError;
pub use types::{HealthStatus, QueueSnapshot, StatementFailure, TxStage};

pub use traits::{ConnectionPool, FailureSink, PooledConnection, SnapshotStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opsdash_error_has_all_variants() {
        let _config = OpsdashError::Config("test".into());
        let _storage = OpsdashError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _snapshot = OpsdashError::Snapshot {
            queue: "dashboard".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _tx = OpsdashError::Transaction {
            stage: TxStage::Execute,
            source: Box::new(std::io::Error::other("test")),
        };
        let _timeout = OpsdashError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = OpsdashError::Internal("test".into());
    }

    #[test]
    fn transaction_error_names_the_stage() {
        let err = OpsdashError::Transaction {
            stage: TxStage::Commit,
            source: Box::new(std::io::Error::other("disk full")),
        };
        assert_eq!(err.to_string(), "transaction failed at commit: disk full");
        assert_eq!(err.stage(), Some(TxStage::Commit));
        assert_eq!(OpsdashError::Internal("x".into()).stage(), None);
    }

    #[test]
    fn all_port_traits_are_exported() {
        fn _assert_pool<T: ConnectionPool>() {}
        fn _assert_snapshot_store<T: SnapshotStore>() {}
        fn _assert_failure_sink<T: FailureSink>() {}
    }
}

// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite backend and on-disk persistence for the opsdash write queue.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! [`SqlitePool`] implementing the transactional connection port, atomic
//! JSON snapshot files, and timestamped failure records.

pub mod database;
pub mod failure_log;
pub mod migrations;
pub mod pool;
pub mod snapshot;

pub use database::Database;
pub use failure_log::FileFailureLog;
pub use pool::SqlitePool;
pub use snapshot::FileSnapshotStore;

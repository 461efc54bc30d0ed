// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock connection pool for deterministic write queue tests.
//!
//! `MockPool` implements `ConnectionPool` without a database. Every statement
//! that reaches a connection is recorded; statements can be scripted to fail
//! at a given transaction stage or to hang, and a [`Gate`] can hold every
//! statement in flight.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use opsdash_core::{ConnectionPool, HealthStatus, OpsdashError, PooledConnection, TxStage};

use crate::gate::Gate;

#[derive(Debug, Clone, Copy)]
struct ScriptedFailure {
    stage: TxStage,
    /// Remaining failures; `None` fails forever.
    remaining: Option<usize>,
}

#[derive(Default)]
struct MockPoolInner {
    attempted: Mutex<Vec<String>>,
    committed: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, ScriptedFailure>>,
    hanging: Mutex<HashSet<String>>,
    fail_acquire: AtomicBool,
    acquired: AtomicUsize,
    released: AtomicUsize,
    gate: Gate,
}

impl MockPoolInner {
    /// Consume one scripted failure for `statement`, if any.
    fn take_failure(&self, statement: &str) -> Option<TxStage> {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        let scripted = failures.get_mut(statement)?;
        let stage = scripted.stage;
        if let Some(n) = scripted.remaining.as_mut() {
            *n -= 1;
            if *n == 0 {
                failures.remove(statement);
            }
        }
        Some(stage)
    }
}

/// A mock pool whose connections run statements against an in-memory log.
///
/// Cloning shares the underlying log, so a test can keep one handle while
/// the queue owns another.
#[derive(Clone, Default)]
pub struct MockPool {
    inner: Arc<MockPoolInner>,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `statement` fail at `stage` on every attempt.
    pub fn fail_on(&self, statement: &str, stage: TxStage) {
        self.script(statement, stage, None);
    }

    /// Make `statement` fail at `stage` on its next attempt only.
    pub fn fail_once(&self, statement: &str, stage: TxStage) {
        self.script(statement, stage, Some(1));
    }

    fn script(&self, statement: &str, stage: TxStage, remaining: Option<usize>) {
        self.inner
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(statement.to_string(), ScriptedFailure { stage, remaining });
    }

    /// Remove every scripted failure.
    pub fn clear_failures(&self) {
        self.inner.failures.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Make `statement` never complete. With a timeout it fails with
    /// [`OpsdashError::Timeout`] once the timeout elapses, without committing.
    pub fn hang_on(&self, statement: &str) {
        self.inner
            .hanging
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(statement.to_string());
    }

    /// Make `acquire` fail until reset.
    pub fn set_fail_acquire(&self, fail: bool) {
        self.inner.fail_acquire.store(fail, Ordering::Release);
    }

    /// Gate every statement passes through before it runs.
    pub fn gate(&self) -> &Gate {
        &self.inner.gate
    }

    /// Statements that reached a connection, in arrival order.
    pub fn attempted(&self) -> Vec<String> {
        self.inner.attempted.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Statements that committed, in commit order.
    pub fn committed(&self) -> Vec<String> {
        self.inner.committed.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// How many times `statement` committed.
    pub fn commit_count(&self, statement: &str) -> usize {
        self.inner
            .committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| *s == statement)
            .count()
    }

    pub fn acquired(&self) -> usize {
        self.inner.acquired.load(Ordering::Acquire)
    }

    pub fn released(&self) -> usize {
        self.inner.released.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ConnectionPool for MockPool {
    fn name(&self) -> &str {
        "mock-pool"
    }

    async fn acquire(&self) -> Result<Box<dyn PooledConnection>, OpsdashError> {
        if self.inner.fail_acquire.load(Ordering::Acquire) {
            return Err(OpsdashError::Storage {
                source: "mock pool unavailable".into(),
            });
        }
        self.inner.acquired.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(MockConnection {
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn health_check(&self) -> Result<HealthStatus, OpsdashError> {
        if self.inner.fail_acquire.load(Ordering::Acquire) {
            Ok(HealthStatus::Unhealthy("mock pool unavailable".to_string()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }
}

struct MockConnection {
    inner: Arc<MockPoolInner>,
}

#[async_trait]
impl PooledConnection for MockConnection {
    async fn run_in_transaction(
        &self,
        statement: &str,
        timeout: Option<Duration>,
    ) -> Result<(), OpsdashError> {
        self.inner
            .attempted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(statement.to_string());

        self.inner.gate.pass().await;

        let hangs = self.inner.hanging.lock().unwrap_or_else(PoisonError::into_inner).contains(statement);
        if hangs {
            match timeout {
                Some(duration) => {
                    tokio::time::sleep(duration).await;
                    return Err(OpsdashError::Timeout { duration });
                }
                None => std::future::pending::<()>().await,
            }
        }

        if let Some(stage) = self.inner.take_failure(statement) {
            return Err(OpsdashError::Transaction {
                stage,
                source: format!("mock failure: {statement}").into(),
            });
        }

        self.inner
            .committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(statement.to_string());
        Ok(())
    }

    fn release(self: Box<Self>) {
        self.inner.released.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn statements_commit_in_order() {
        let pool = MockPool::new();
        let conn = pool.acquire().await.unwrap();
        conn.run_in_transaction("A", None).await.unwrap();
        conn.run_in_transaction("B", None).await.unwrap();
        conn.release();

        assert_eq!(pool.committed(), vec!["A", "B"]);
        assert_eq!(pool.acquired(), 1);
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn fail_once_recovers_on_retry() {
        let pool = MockPool::new();
        pool.fail_once("B", TxStage::Commit);
        let conn = pool.acquire().await.unwrap();

        let err = conn.run_in_transaction("B", None).await.unwrap_err();
        assert_eq!(err.stage(), Some(TxStage::Commit));
        conn.run_in_transaction("B", None).await.unwrap();

        assert_eq!(pool.attempted(), vec!["B", "B"]);
        assert_eq!(pool.commit_count("B"), 1);
    }

    #[tokio::test]
    async fn fail_on_persists_until_cleared() {
        let pool = MockPool::new();
        pool.fail_on("X", TxStage::Execute);
        let conn = pool.acquire().await.unwrap();

        assert!(conn.run_in_transaction("X", None).await.is_err());
        assert!(conn.run_in_transaction("X", None).await.is_err());
        pool.clear_failures();
        conn.run_in_transaction("X", None).await.unwrap();
    }

    #[tokio::test]
    async fn acquire_failure_is_storage_error() {
        let pool = MockPool::new();
        pool.set_fail_acquire(true);
        assert!(matches!(
            pool.acquire().await.err(),
            Some(OpsdashError::Storage { .. })
        ));
        assert_eq!(
            pool.health_check().await.unwrap(),
            HealthStatus::Unhealthy("mock pool unavailable".to_string())
        );
    }

    #[tokio::test]
    async fn hanging_statement_never_completes() {
        let pool = MockPool::new();
        pool.hang_on("slow");
        let conn = pool.acquire().await.unwrap();

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            conn.run_in_transaction("slow", None),
        )
        .await;
        assert!(result.is_err());
        assert!(pool.committed().is_empty());
    }

    #[tokio::test]
    async fn hanging_statement_times_out_without_committing() {
        let pool = MockPool::new();
        pool.hang_on("slow");
        let conn = pool.acquire().await.unwrap();

        let err = conn
            .run_in_transaction("slow", Some(Duration::from_millis(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, OpsdashError::Timeout { .. }));
        assert!(pool.committed().is_empty());
        conn.release();
    }
}

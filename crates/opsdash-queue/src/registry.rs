// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named write queues sharing one pool, snapshot store and failure sink.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use opsdash_core::{ConnectionPool, FailureSink, SnapshotStore};
use tokio::sync::Mutex;
use tracing::info;

use crate::queue::{PersistOutcome, QueueSettings, WriteQueue};

/// Process-wide set of write queues, keyed by name.
///
/// Opening a name that is already open returns the existing queue, so each
/// queue (and its snapshot) has exactly one owner in the process.
pub struct QueueRegistry {
    queues: RwLock<BTreeMap<String, Arc<WriteQueue>>>,
    /// Serializes `open` so a snapshot is restored at most once.
    opening: Mutex<()>,
    settings: QueueSettings,
    pool: Arc<dyn ConnectionPool>,
    snapshots: Arc<dyn SnapshotStore>,
    failures: Arc<dyn FailureSink>,
}

impl QueueRegistry {
    pub fn new(
        settings: QueueSettings,
        pool: Arc<dyn ConnectionPool>,
        snapshots: Arc<dyn SnapshotStore>,
        failures: Arc<dyn FailureSink>,
    ) -> Self {
        Self {
            queues: RwLock::new(BTreeMap::new()),
            opening: Mutex::new(()),
            settings,
            pool,
            snapshots,
            failures,
        }
    }

    /// Return the queue called `name`, opening and restoring it first if
    /// this is the first request for it.
    pub async fn open(&self, name: &str) -> Arc<WriteQueue> {
        if let Some(queue) = self.get(name) {
            return queue;
        }

        let _opening = self.opening.lock().await;
        if let Some(queue) = self.get(name) {
            return queue;
        }

        let queue = Arc::new(
            WriteQueue::open(
                name,
                self.settings.clone(),
                Arc::clone(&self.pool),
                Arc::clone(&self.snapshots),
                Arc::clone(&self.failures),
            )
            .await,
        );
        self.queues
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&queue));
        info!(queue = name, pending = queue.pending_len(), "queue opened");
        queue
    }

    pub fn get(&self, name: &str) -> Option<Arc<WriteQueue>> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// All open queues, ordered by name.
    pub fn queues(&self) -> Vec<Arc<WriteQueue>> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queues.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist every open queue. Failures are logged by each queue.
    /// Returns the number of queues whose snapshot was written.
    pub async fn persist_all(&self) -> usize {
        let mut saved = 0;
        for queue in self.queues() {
            if matches!(queue.persist().await, Ok(PersistOutcome::Saved { .. })) {
                saved += 1;
            }
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdash_core::QueueSnapshot;
    use opsdash_test_utils::{MemorySnapshotStore, MockPool, RecordingFailureSink};

    fn registry(store: &MemorySnapshotStore) -> QueueRegistry {
        QueueRegistry::new(
            QueueSettings::default(),
            Arc::new(MockPool::new()),
            Arc::new(store.clone()),
            Arc::new(RecordingFailureSink::new()),
        )
    }

    #[tokio::test]
    async fn open_returns_the_same_queue() {
        let store = MemorySnapshotStore::new();
        let registry = registry(&store);

        let a = registry.open("dashboard").await;
        let b = registry.open("dashboard").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn open_restores_each_queue_once() {
        let store = MemorySnapshotStore::new();
        store.insert("dashboard", QueueSnapshot::new(&["A".to_string()], &[]));
        let registry = registry(&store);

        let queue = registry.open("dashboard").await;
        registry.open("dashboard").await;
        assert_eq!(queue.pending(), vec!["A"]);
    }

    #[tokio::test]
    async fn persist_all_saves_every_queue() {
        let store = MemorySnapshotStore::new();
        let registry = registry(&store);
        registry.open("dashboard").await.enqueue("A");
        registry.open("ping_awards").await.enqueue("B");

        assert_eq!(registry.persist_all().await, 2);
        assert_eq!(registry.names(), vec!["dashboard", "ping_awards"]);
        assert_eq!(
            store.get("ping_awards"),
            Some(QueueSnapshot::new(&["B".to_string()], &[]))
        );
    }

    #[test]
    fn unknown_queue_is_none() {
        let registry = registry(&MemorySnapshotStore::new());
        assert!(registry.get("nope").is_none());
        assert!(registry.is_empty());
    }
}

// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory snapshot store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use opsdash_core::{OpsdashError, QueueSnapshot, SnapshotStore};

use crate::gate::Gate;

#[derive(Default)]
struct Inner {
    snapshots: Mutex<HashMap<String, QueueSnapshot>>,
    saves: AtomicUsize,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    gate: Gate,
}

/// [`SnapshotStore`] keeping snapshots in a map.
///
/// Saves pass through a [`Gate`] before they land, so tests can hold a
/// persist in flight.
#[derive(Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<Inner>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the stored snapshot for `queue`.
    pub fn insert(&self, queue: &str, snapshot: QueueSnapshot) {
        self.inner
            .snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(queue.to_string(), snapshot);
    }

    pub fn get(&self, queue: &str) -> Option<QueueSnapshot> {
        self.inner.snapshots.lock().unwrap_or_else(PoisonError::into_inner).get(queue).cloned()
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::Acquire)
    }

    /// Make `load` fail as if the stored snapshot were unreadable.
    pub fn set_fail_loads(&self, fail: bool) {
        self.inner.fail_loads.store(fail, Ordering::Release);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.inner.fail_saves.store(fail, Ordering::Release);
    }

    pub fn gate(&self) -> &Gate {
        &self.inner.gate
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, queue: &str) -> Result<Option<QueueSnapshot>, OpsdashError> {
        if self.inner.fail_loads.load(Ordering::Acquire) {
            return Err(OpsdashError::Snapshot {
                queue: queue.to_string(),
                source: "mock snapshot is corrupt".into(),
            });
        }
        Ok(self.get(queue))
    }

    async fn save(&self, queue: &str, snapshot: &QueueSnapshot) -> Result<(), OpsdashError> {
        self.inner.gate.pass().await;
        if self.inner.fail_saves.load(Ordering::Acquire) {
            return Err(OpsdashError::Snapshot {
                queue: queue.to_string(),
                source: "mock disk full".into(),
            });
        }
        self.insert(queue, snapshot.clone());
        self.inner.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

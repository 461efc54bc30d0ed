// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON snapshot files for write queues.
//!
//! Each queue owns `<dir>/<queue>.json`. A save writes `<dir>/<queue>_TEMP.json`,
//! fsyncs it, then renames it over the live file, so a crash at any point
//! leaves either the old or the new snapshot, never a torn one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use opsdash_core::{OpsdashError, QueueSnapshot, SnapshotStore};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// [`SnapshotStore`] backed by one JSON file per queue in a directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the live snapshot for `queue`.
    pub fn snapshot_path(&self, queue: &str) -> PathBuf {
        self.dir.join(format!("{queue}.json"))
    }

    fn temp_path(&self, queue: &str) -> PathBuf {
        self.dir.join(format!("{queue}_TEMP.json"))
    }

    /// Write and fsync the temp file. The live snapshot is untouched until
    /// [`Self::commit_temp`] renames it into place.
    async fn write_temp(&self, queue: &str, snapshot: &QueueSnapshot) -> Result<PathBuf, OpsdashError> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(|e| snapshot_err(queue, e))?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| snapshot_err(queue, e))?;

        let temp = self.temp_path(queue);
        let mut file = tokio::fs::File::create(&temp)
            .await
            .map_err(|e| snapshot_err(queue, e))?;
        file.write_all(&bytes).await.map_err(|e| snapshot_err(queue, e))?;
        file.sync_all().await.map_err(|e| snapshot_err(queue, e))?;
        Ok(temp)
    }

    async fn commit_temp(&self, queue: &str, temp: &Path) -> Result<(), OpsdashError> {
        tokio::fs::rename(temp, self.snapshot_path(queue))
            .await
            .map_err(|e| snapshot_err(queue, e))
    }
}

fn snapshot_err(
    queue: &str,
    e: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> OpsdashError {
    OpsdashError::Snapshot {
        queue: queue.to_string(),
        source: e.into(),
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self, queue: &str) -> Result<Option<QueueSnapshot>, OpsdashError> {
        let path = self.snapshot_path(queue);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(snapshot_err(queue, e)),
        };
        let snapshot: QueueSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| snapshot_err(queue, e))?;
        debug!(queue, path = %path.display(), entries = snapshot.len(), "snapshot loaded");
        Ok(Some(snapshot))
    }

    async fn save(&self, queue: &str, snapshot: &QueueSnapshot) -> Result<(), OpsdashError> {
        let temp = self.write_temp(queue, snapshot).await?;
        self.commit_temp(queue, &temp).await?;
        debug!(queue, entries = snapshot.len(), "snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn snapshot(pending: &[&str], processing: &[&str]) -> QueueSnapshot {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        QueueSnapshot::new(&owned(pending), &owned(processing))
    }

    #[tokio::test]
    async fn missing_snapshot_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        assert!(store.load("dashboard").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("cache"));
        let saved = snapshot(&["C"], &["A", "B"]);

        store.save("dashboard", &saved).await.unwrap();

        assert_eq!(store.load("dashboard").await.unwrap(), Some(saved));
        assert!(!store.temp_path("dashboard").exists());
    }

    #[tokio::test]
    async fn interrupted_save_leaves_previous_snapshot_intact() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let first = snapshot(&["A"], &[]);
        store.save("dashboard", &first).await.unwrap();

        // Crash after the temp write, before the rename.
        store
            .write_temp("dashboard", &snapshot(&["A", "B", "C"], &[]))
            .await
            .unwrap();

        assert_eq!(store.load("dashboard").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn torn_temp_file_is_overwritten_by_next_save() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        std::fs::write(store.temp_path("dashboard"), b"{\"pending\": [\"A\"").unwrap();

        let next = snapshot(&["B"], &[]);
        store.save("dashboard", &next).await.unwrap();
        assert_eq!(store.load("dashboard").await.unwrap(), Some(next));
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_an_error() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        std::fs::write(store.snapshot_path("dashboard"), b"not json").unwrap();

        let err = store.load("dashboard").await.unwrap_err();
        assert!(matches!(err, OpsdashError::Snapshot { ref queue, .. } if queue == "dashboard"));
    }

    #[tokio::test]
    async fn queues_do_not_share_files() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        store.save("dashboard", &snapshot(&["A"], &[])).await.unwrap();
        store.save("ping_awards", &snapshot(&["B"], &[])).await.unwrap();

        let dashboard = store.load("dashboard").await.unwrap().unwrap();
        assert_eq!(dashboard.pending, vec![Some("A".to_string())]);
    }
}

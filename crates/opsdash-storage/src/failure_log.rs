// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamped diagnostic files for statements that fail during a flush.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use opsdash_core::{FailureSink, StatementFailure};
use tracing::{error, warn};

/// [`FailureSink`] writing one text file per failed statement.
///
/// Files are named `write-failure-<queue>-<unix_millis>-<index>.txt` and hold
/// `<statement>|<stage>|<error>`.
#[derive(Debug, Clone)]
pub struct FileFailureLog {
    dir: PathBuf,
}

impl FileFailureLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, failure: &StatementFailure, millis: i64) -> PathBuf {
        self.dir.join(format!(
            "write-failure-{}-{millis}-{}.txt",
            failure.queue, failure.index
        ))
    }
}

fn render(failure: &StatementFailure) -> String {
    let stage = failure
        .stage
        .map(|s| s.to_string())
        .unwrap_or_else(|| "connection".to_string());
    format!("{}|{stage}|{}", failure.statement, failure.error)
}

#[async_trait]
impl FailureSink for FileFailureLog {
    async fn record(&self, failure: &StatementFailure) {
        error!(
            queue = %failure.queue,
            index = failure.index,
            stage = ?failure.stage,
            error = %failure.error,
            "queued statement failed"
        );

        let path = self.record_path(failure, chrono::Utc::now().timestamp_millis());
        let write = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&path, render(failure)).await
        };
        if let Err(e) = write.await {
            warn!(path = %path.display(), error = %e, "could not write failure record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdash_core::TxStage;
    use tempfile::tempdir;

    fn failure(stage: Option<TxStage>) -> StatementFailure {
        StatementFailure {
            queue: "dashboard".to_string(),
            index: 3,
            statement: "UPDATE views SET active = 0".to_string(),
            stage,
            error: "no such column: active".to_string(),
        }
    }

    #[tokio::test]
    async fn record_writes_statement_stage_and_error() {
        let dir = tempdir().unwrap();
        let log = FileFailureLog::new(dir.path().join("logs"));

        log.record(&failure(Some(TxStage::Execute))).await;

        let entries: Vec<_> = std::fs::read_dir(log.dir()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let path = entries[0].as_ref().unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("write-failure-dashboard-"));
        assert!(name.ends_with("-3.txt"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "UPDATE views SET active = 0|execute|no such column: active"
        );
    }

    #[test]
    fn connection_failures_render_without_stage() {
        assert_eq!(
            render(&failure(None)),
            "UPDATE views SET active = 0|connection|no such column: active"
        );
    }

    #[tokio::test]
    async fn unwritable_directory_does_not_panic() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        // A regular file where the directory should be.
        let log = FileFailureLog::new(&blocker);
        log.record(&failure(None)).await;
    }
}

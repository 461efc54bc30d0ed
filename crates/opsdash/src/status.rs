// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdash status` command implementation.
//!
//! Reads each configured queue's snapshot and reports how many statements
//! are waiting. Works whether or not the server is running; the figures are
//! as of the last snapshot write.

use opsdash_config::model::OpsdashConfig;
use opsdash_core::{OpsdashError, QueueSnapshot, SnapshotStore};
use opsdash_storage::FileSnapshotStore;
use serde::Serialize;

/// One queue's line in the status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub name: String,
    /// False when no snapshot has been written yet.
    pub snapshot: bool,
    pub pending: usize,
    pub processing: usize,
    /// Unreadable snapshot, if any.
    pub error: Option<String>,
}

impl QueueStatus {
    fn from_snapshot(name: &str, snapshot: Option<QueueSnapshot>) -> Self {
        let (pending, processing) = snapshot
            .as_ref()
            .map(|s| (s.pending.len(), s.processing.len()))
            .unwrap_or((0, 0));
        Self {
            name: name.to_string(),
            snapshot: snapshot.is_some(),
            pending,
            processing,
            error: None,
        }
    }
}

/// Collect the status of every configured queue.
pub async fn collect_status(config: &OpsdashConfig) -> Vec<QueueStatus> {
    let store = FileSnapshotStore::new(config.queue.cache_path());
    let mut statuses = Vec::with_capacity(config.queue.names.len());
    for name in &config.queue.names {
        let status = match store.load(name).await {
            Ok(snapshot) => QueueStatus::from_snapshot(name, snapshot),
            Err(e) => QueueStatus {
                error: Some(e.to_string()),
                ..QueueStatus::from_snapshot(name, None)
            },
        };
        statuses.push(status);
    }
    statuses
}

fn render_plain(statuses: &[QueueStatus]) -> String {
    let mut out = String::new();
    for s in statuses {
        let line = match (&s.error, s.snapshot) {
            (Some(error), _) => format!("{}: unreadable snapshot ({error})", s.name),
            (None, false) => format!("{}: no snapshot", s.name),
            (None, true) => format!(
                "{}: {} pending, {} processing",
                s.name, s.pending, s.processing
            ),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Run the `opsdash status` command.
pub async fn run_status(config: &OpsdashConfig, json: bool) -> Result<(), OpsdashError> {
    let statuses = collect_status(config).await;
    if json {
        let rendered = serde_json::to_string_pretty(&statuses)
            .map_err(|e| OpsdashError::Internal(format!("failed to render status: {e}")))?;
        println!("{rendered}");
    } else {
        print!("{}", render_plain(&statuses));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reports_each_configured_queue() {
        let dir = tempdir().unwrap();
        let mut config = OpsdashConfig::default();
        config.queue.cache_dir = dir.path().to_string_lossy().into_owned();
        config.queue.names = vec!["dashboard".into(), "ping_awards".into(), "broken".into()];

        let store = FileSnapshotStore::new(dir.path());
        store
            .save(
                "dashboard",
                &QueueSnapshot::new(&["C".to_string()], &["A".to_string(), "B".to_string()]),
            )
            .await
            .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        let statuses = collect_status(&config).await;
        assert_eq!(statuses[0].pending, 1);
        assert_eq!(statuses[0].processing, 2);
        assert!(!statuses[1].snapshot);
        assert!(statuses[2].error.is_some());

        let plain = render_plain(&statuses);
        assert!(plain.contains("dashboard: 1 pending, 2 processing"));
        assert!(plain.contains("ping_awards: no snapshot"));
        assert!(plain.contains("broken: unreadable snapshot"));
    }

    #[test]
    fn json_output_names_fields() {
        let status = QueueStatus::from_snapshot("dashboard", Some(QueueSnapshot::default()));
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["name"], "dashboard");
        assert_eq!(value["snapshot"], true);
        assert_eq!(value["error"], serde_json::Value::Null);
    }
}

// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Statements built by the records run cleanly against the real schema.

use std::sync::Arc;

use opsdash_models::{QueuedRecord, ServiceQueue, ServiceQueuePatch, View, ViewPatch};
use opsdash_queue::{CycleOutcome, QueueSettings, WriteQueue};
use opsdash_storage::{Database, SqlitePool};
use opsdash_test_utils::{MemorySnapshotStore, RecordingFailureSink};
use tempfile::tempdir;

async fn query_strings(db: &Database, sql: &'static str) -> Vec<String> {
    db.connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn view_insert_and_update_apply_through_the_queue() {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path().join("dash.db").to_str().unwrap(), true)
        .await
        .unwrap();
    let sink = RecordingFailureSink::new();
    let queue = WriteQueue::new(
        "dashboard",
        QueueSettings {
            concurrency: 1,
            ..QueueSettings::default()
        },
        Arc::new(SqlitePool::new(&db)),
        Arc::new(MemorySnapshotStore::new()),
        Arc::new(sink.clone()),
    );

    queue.enqueue("INSERT INTO users (mnemonic) VALUES ('ab1234'), ('cd5678')");
    queue.enqueue("INSERT INTO \"groups\" (mnemonic) VALUES ('dba'), ('noc')");

    let mut view = View::new("o'neil_east");
    view.creator = "ab1234".to_string();
    assert!(view.submit_insert(&queue));

    view.apply(ViewPatch {
        display: Some("O'Neil East".to_string()),
        client: Some("ACME, Globex".to_string()),
        groups: Some(vec!["noc".to_string(), "dba".to_string()]),
        update_by: Some("cd5678".to_string()),
        ..ViewPatch::default()
    });
    view.add_owner("ab1234");
    view.add_owner("cd5678");
    assert!(view.submit_update(&queue));

    let mut service = ServiceQueue::new("NOC_T1");
    assert!(service.submit_insert(&queue));
    service.apply(ServiceQueuePatch {
        client_team_name: Some("Tier 1".to_string()),
        active: Some(2),
        ..ServiceQueuePatch::default()
    });
    assert!(service.submit_update(&queue));

    let outcome = queue.trigger_cycle().await;
    assert!(
        matches!(outcome, CycleOutcome::Success { executed: 6 }),
        "got {outcome:?}, failures: {:?}",
        sink.records()
    );

    assert_eq!(
        query_strings(&db, "SELECT display || '|' || client FROM views").await,
        vec!["O'Neil East|ACME,Globex"]
    );
    assert_eq!(
        query_strings(
            &db,
            "SELECT u.mnemonic FROM view_owner_r r JOIN users u ON u.id = r.user_id ORDER BY u.mnemonic"
        )
        .await,
        vec!["ab1234", "cd5678"]
    );
    assert_eq!(
        query_strings(
            &db,
            "SELECT g.mnemonic FROM view_group_r r JOIN \"groups\" g ON g.id = r.group_id ORDER BY g.mnemonic"
        )
        .await,
        vec!["dba", "noc"]
    );
    assert_eq!(
        query_strings(&db, "SELECT client_team_name || '|' || active FROM queues").await,
        vec!["Tier 1|1"]
    );

    // Updating again replaces the relations rather than adding to them.
    view.owners.clear();
    view.add_owner("cd5678");
    view.submit_update(&queue);
    queue.trigger_cycle().await;
    assert_eq!(
        query_strings(
            &db,
            "SELECT u.mnemonic FROM view_owner_r r JOIN users u ON u.id = r.user_id"
        )
        .await,
        vec!["cd5678"]
    );

    drop(queue);
    db.close().await.unwrap();
}

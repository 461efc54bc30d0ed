// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdash serve` command implementation.
//!
//! Opens the dashboard database, restores every configured write queue from
//! its snapshot, and runs the cron flush scheduler until SIGINT or SIGTERM.
//! On shutdown the scheduler stops firing, in-flight cycles are drained and
//! every queue is persisted one last time.

use std::sync::Arc;
use std::time::Duration;

use opsdash_config::model::OpsdashConfig;
use opsdash_core::{ConnectionPool, HealthStatus, OpsdashError};
use opsdash_cron::{QueueScheduler, RuntimeFlags};
use opsdash_queue::{QueueRegistry, QueueSettings};
use opsdash_storage::{Database, FileFailureLog, FileSnapshotStore, SqlitePool};
use tracing::{info, warn};

use crate::shutdown;

/// How long shutdown waits for running flush cycles.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// The database plus the queues writing to it.
pub struct Backend {
    pub db: Database,
    pub pool: SqlitePool,
    pub registry: Arc<QueueRegistry>,
}

impl Backend {
    /// Open the database and restore every configured queue.
    pub async fn open(config: &OpsdashConfig) -> Result<Self, OpsdashError> {
        let db = Database::open_with(&config.storage).await?;
        let pool = SqlitePool::new(&db);

        let registry = Arc::new(QueueRegistry::new(
            QueueSettings::from(&config.queue),
            Arc::new(pool.clone()),
            Arc::new(FileSnapshotStore::new(config.queue.cache_path())),
            Arc::new(FileFailureLog::new(config.queue.failure_log_path())),
        ));
        for name in &config.queue.names {
            registry.open(name).await;
        }

        Ok(Self { db, pool, registry })
    }

    /// Persist every queue and close the database.
    pub async fn close(self) -> Result<(), OpsdashError> {
        let saved = self.registry.persist_all().await;
        info!(saved, queues = self.registry.len(), "final snapshots written");
        drop(self.registry);
        drop(self.pool);
        self.db.close().await
    }
}

/// Runs the `opsdash serve` command.
pub async fn run_serve(config: OpsdashConfig) -> Result<(), OpsdashError> {
    init_tracing(&config.server.log_level);
    info!(name = %config.server.name, "opsdash starting");

    let backend = Backend::open(&config).await?;
    match backend.pool.health_check().await? {
        HealthStatus::Healthy => info!(pool = backend.pool.name(), "database healthy"),
        other => warn!(pool = backend.pool.name(), status = ?other, "database degraded"),
    }

    let flags = Arc::new(RuntimeFlags::new(true, config.queue.paused));
    if flags.is_paused() {
        warn!("flushing is paused; statements will queue until unpaused");
    }
    let scheduler = QueueScheduler::from_config(
        &config.queue,
        Arc::clone(&backend.registry),
        Arc::clone(&flags),
    )?;

    let cancel = shutdown::install_signal_handler();
    scheduler.run(cancel).await;
    drop(scheduler);

    flags.set_running(false);
    shutdown::drain_queues(&backend.registry, DRAIN_TIMEOUT).await;
    log_heap_usage();
    backend.close().await?;

    info!("opsdash stopped");
    Ok(())
}

#[cfg(not(target_env = "msvc"))]
fn log_heap_usage() {
    let _ = tikv_jemalloc_ctl::epoch::advance();
    if let Ok(allocated) = tikv_jemalloc_ctl::stats::allocated::read() {
        info!(allocated_mb = allocated / (1024 * 1024), "heap usage at shutdown");
    }
}

#[cfg(target_env = "msvc")]
fn log_heap_usage() {}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("opsdash={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

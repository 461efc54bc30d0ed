// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the flush scheduler monitors. In-flight flush
//! cycles are drained before the final snapshots are written.

use std::time::Duration;

use opsdash_queue::QueueRegistry;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "could not install SIGTERM handler, listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            info!("received SIGINT (Ctrl+C), initiating shutdown");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}

/// Waits up to `timeout` for running flush cycles to finish.
///
/// Returns `true` if every queue went idle in time.
pub async fn drain_queues(registry: &QueueRegistry, timeout: Duration) -> bool {
    let busy = |registry: &QueueRegistry| {
        registry
            .queues()
            .iter()
            .filter(|q| q.is_flushing())
            .count()
    };

    let flushing = busy(registry);
    if flushing == 0 {
        info!("no flush cycles to drain");
        return true;
    }
    info!(count = flushing, "waiting for flush cycles to complete");

    let deadline = tokio::time::Instant::now() + timeout;
    let mut interval = tokio::time::interval(Duration::from_millis(50));
    loop {
        interval.tick().await;
        let flushing = busy(registry);
        if flushing == 0 {
            info!("all flush cycles completed");
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            warn!(count = flushing, "drain timeout reached, flush cycles still running");
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use opsdash_queue::QueueSettings;
    use opsdash_test_utils::{MemorySnapshotStore, MockPool, RecordingFailureSink};

    fn registry(pool: &MockPool) -> QueueRegistry {
        QueueRegistry::new(
            QueueSettings::default(),
            Arc::new(pool.clone()),
            Arc::new(MemorySnapshotStore::new()),
            Arc::new(RecordingFailureSink::new()),
        )
    }

    #[test]
    fn install_signal_handler_returns_uncancelled_token() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let token = install_signal_handler();
            assert!(!token.is_cancelled());
        });
    }

    #[tokio::test]
    async fn idle_registry_drains_immediately() {
        let pool = MockPool::new();
        let registry = registry(&pool);
        registry.open("dashboard").await;
        assert!(drain_queues(&registry, Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn drain_waits_for_running_cycle() {
        let pool = MockPool::new();
        let registry = registry(&pool);
        let queue = registry.open("dashboard").await;
        queue.enqueue("A");
        pool.gate().close();

        let flush = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.trigger_cycle().await }
        });
        while !queue.is_flushing() {
            tokio::task::yield_now().await;
        }

        assert!(!drain_queues(&registry, Duration::from_millis(100)).await);

        pool.gate().open();
        assert!(drain_queues(&registry, Duration::from_secs(5)).await);
        flush.await.unwrap();
        assert_eq!(pool.commit_count("A"), 1);
    }
}

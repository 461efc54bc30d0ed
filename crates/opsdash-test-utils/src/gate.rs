// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A latch that lets tests hold mocked operations in flight.

use tokio::sync::watch;

/// Open by default. While closed, [`Gate::pass`] waits until it reopens.
#[derive(Debug)]
pub struct Gate {
    open: watch::Sender<bool>,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            open: watch::Sender::new(true),
        }
    }

    pub fn close(&self) {
        self.open.send_replace(false);
    }

    pub fn open(&self) {
        self.open.send_replace(true);
    }

    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Wait until the gate is open.
    pub async fn pass(&self) {
        let mut rx = self.open.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

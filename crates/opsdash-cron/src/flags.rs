// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide switches consulted on every scheduler firing.

use std::sync::atomic::{AtomicBool, Ordering};

/// `running` is cleared during shutdown; `paused` is an operator switch
/// that stops flushing while still accepting writes.
#[derive(Debug)]
pub struct RuntimeFlags {
    running: AtomicBool,
    paused: AtomicBool,
}

impl RuntimeFlags {
    pub fn new(running: bool, paused: bool) -> Self {
        Self {
            running: AtomicBool::new(running),
            paused: AtomicBool::new(paused),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }
}

impl Default for RuntimeFlags {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_running_and_unpaused() {
        let flags = RuntimeFlags::default();
        assert!(flags.is_running());
        assert!(!flags.is_paused());
    }

    #[test]
    fn flags_toggle_independently() {
        let flags = RuntimeFlags::default();
        flags.set_paused(true);
        flags.set_running(false);
        assert!(flags.is_paused());
        assert!(!flags.is_running());
    }
}

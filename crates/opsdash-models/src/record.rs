// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use opsdash_queue::WriteQueue;

/// A record whose writes go through a [`WriteQueue`].
pub trait QueuedRecord {
    /// Statement creating the record's row.
    fn insert_statement(&self) -> String;

    /// Statement bringing the stored row in line with this record.
    fn update_statement(&self) -> String;

    /// Queue the insert. Returns whether the queue accepted it.
    fn submit_insert(&self, queue: &WriteQueue) -> bool {
        queue.enqueue(self.insert_statement())
    }

    /// Queue the update. Returns whether the queue accepted it.
    fn submit_update(&self, queue: &WriteQueue) -> bool {
        queue.enqueue(self.update_statement())
    }
}

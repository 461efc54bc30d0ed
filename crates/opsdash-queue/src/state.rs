// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The pending and processing lists of a write queue.

use std::collections::VecDeque;

use opsdash_core::QueueSnapshot;

#[derive(Debug, Default)]
pub(crate) struct QueueState {
    /// Accepted statements not yet claimed, oldest first.
    pending: VecDeque<String>,
    /// The claimed batch. Non-empty only while a flush runs or after one failed.
    processing: Vec<String>,
    /// Position in the last flushed batch where it failed.
    error_index: Option<usize>,
}

impl QueueState {
    pub(crate) fn push(&mut self, statement: String) {
        self.pending.push_back(statement);
    }

    /// Return the batch to run.
    ///
    /// A leftover batch from a failed cycle is retried as is. Otherwise up to
    /// `max` of the oldest pending statements move into processing.
    pub(crate) fn claim(&mut self, max: usize) -> Vec<String> {
        if self.processing.is_empty() {
            let take = max.min(self.pending.len());
            self.processing = self.pending.drain(..take).collect();
        }
        self.processing.clone()
    }

    /// The whole claimed batch committed.
    pub(crate) fn complete(&mut self) {
        self.processing.clear();
        self.error_index = None;
    }

    /// Keep only the batch positions in `retry`, in their batch order.
    pub(crate) fn retain(&mut self, error_index: usize, retry: &[usize]) {
        let mut batch: Vec<Option<String>> =
            std::mem::take(&mut self.processing).into_iter().map(Some).collect();
        self.processing = retry
            .iter()
            .filter_map(|&i| batch.get_mut(i).and_then(Option::take))
            .collect();
        self.error_index = Some(error_index);
    }

    pub(crate) fn pending(&self) -> Vec<String> {
        self.pending.iter().cloned().collect()
    }

    pub(crate) fn processing(&self) -> &[String] {
        &self.processing
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn error_index(&self) -> Option<usize> {
        self.error_index
    }

    pub(crate) fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            pending: self.pending.iter().cloned().map(Some).collect(),
            processing: self.processing.iter().cloned().map(Some).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state_with(pending: &[&str]) -> QueueState {
        let mut state = QueueState::default();
        for s in pending {
            state.push(s.to_string());
        }
        state
    }

    #[test]
    fn claim_moves_oldest_pending_into_processing() {
        let mut state = state_with(&["A", "B", "C"]);
        assert_eq!(state.claim(2), vec!["A", "B"]);
        assert_eq!(state.pending(), vec!["C"]);
        assert_eq!(state.processing(), ["A", "B"]);
    }

    #[test]
    fn claim_retries_leftover_batch_before_new_work() {
        let mut state = state_with(&["A", "B", "C"]);
        state.claim(3);
        state.retain(1, &[1, 2]);
        state.push("D".to_string());

        assert_eq!(state.claim(10), vec!["B", "C"]);
        assert_eq!(state.pending(), vec!["D"]);
        assert_eq!(state.error_index(), Some(1));
    }

    #[test]
    fn complete_clears_batch_and_error() {
        let mut state = state_with(&["A"]);
        state.claim(1);
        state.retain(0, &[0]);
        state.complete();
        assert!(state.processing().is_empty());
        assert_eq!(state.error_index(), None);
    }

    #[test]
    fn retain_drops_committed_positions() {
        let mut state = state_with(&["A", "B", "C", "D"]);
        state.claim(4);
        // B failed, C committed concurrently, D never started.
        state.retain(1, &[1, 3]);
        assert_eq!(state.processing(), ["B", "D"]);
    }

    #[test]
    fn snapshot_mirrors_both_lists() {
        let mut state = state_with(&["A", "B"]);
        state.claim(1);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.processing, vec![Some("A".to_string())]);
        assert_eq!(snapshot.pending, vec![Some("B".to_string())]);
    }

    proptest! {
        #[test]
        fn claim_respects_cap_and_fifo(count in 0usize..200, max in 1usize..50) {
            let mut state = QueueState::default();
            let all: Vec<String> = (0..count).map(|i| format!("S{i}")).collect();
            for s in &all {
                state.push(s.clone());
            }

            let batch = state.claim(max);
            prop_assert_eq!(batch.len(), count.min(max));
            prop_assert_eq!(&batch[..], &all[..batch.len()]);

            let mut rest = state.processing().to_vec();
            rest.extend(state.pending());
            prop_assert_eq!(rest, all);
        }
    }
}

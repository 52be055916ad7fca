use std::collections::VecDeque;

use crate::core::models::{AnnotationMap, HistoryPosition, HistorySnapshot, RecognizedSummary};
use crate::global_constants;

/// Bounded linear undo log. The cursor always points at the committed state the
/// session is showing; committing after an undo discards the redo branch.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: VecDeque<HistorySnapshot>,
    cursor: usize,
    capacity: usize,
}

impl HistoryManager {
    pub fn new(annotations: &AnnotationMap, recognized_summary: &RecognizedSummary) -> Self {
        Self::with_capacity(global_constants::HISTORY_LIMIT, annotations, recognized_summary)
    }

    pub fn with_capacity(
        capacity: usize,
        annotations: &AnnotationMap,
        recognized_summary: &RecognizedSummary,
    ) -> Self {
        let capacity = capacity.max(1);
        let mut snapshots = VecDeque::with_capacity(capacity);
        snapshots.push_back(HistorySnapshot::capture(annotations, recognized_summary));

        Self {
            snapshots,
            cursor: 0,
            capacity,
        }
    }

    pub fn commit(&mut self, annotations: &AnnotationMap, recognized_summary: &RecognizedSummary) {
        let discarded = self.snapshots.len() - (self.cursor + 1);
        if discarded > 0 {
            log::debug!("[HISTORY] Discarding {} redo snapshots", discarded);
        }
        self.snapshots.truncate(self.cursor + 1);

        self.snapshots
            .push_back(HistorySnapshot::capture(annotations, recognized_summary));

        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }

        self.cursor = self.snapshots.len() - 1;

        log::debug!(
            "[HISTORY] Committed snapshot {}/{}",
            self.cursor + 1,
            self.snapshots.len()
        );
    }

    pub fn undo(&mut self) -> Option<&HistorySnapshot> {
        if self.cursor == 0 {
            log::debug!("[HISTORY] Undo ignored, already at oldest snapshot");
            return None;
        }

        self.cursor -= 1;
        log::debug!("[HISTORY] Undo to snapshot {}", self.cursor);
        self.snapshots.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&HistorySnapshot> {
        if self.cursor + 1 >= self.snapshots.len() {
            log::debug!("[HISTORY] Redo ignored, already at newest snapshot");
            return None;
        }

        self.cursor += 1;
        log::debug!("[HISTORY] Redo to snapshot {}", self.cursor);
        self.snapshots.get(self.cursor)
    }

    /// Drops every snapshot and starts over from the given state.
    pub fn reset(&mut self, annotations: &AnnotationMap, recognized_summary: &RecognizedSummary) {
        self.snapshots.clear();
        self.snapshots
            .push_back(HistorySnapshot::capture(annotations, recognized_summary));
        self.cursor = 0;
        log::debug!("[HISTORY] History reset");
    }

    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.snapshots.get(self.cursor)
    }

    pub fn position(&self) -> HistoryPosition {
        HistoryPosition {
            index: self.cursor,
            length: self.snapshots.len(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

//! Forward-only queue of targets awaiting processing.

use crate::target::QueuedTarget;

/// Ordered targets plus a consumption cursor.
///
/// Iteration is a single forward pass; `next()` past the end keeps returning
/// `None`. [`TargetQueue::reset`] rewinds the cursor for reuse.
#[derive(Debug, Clone, Default)]
pub struct TargetQueue {
    entries: Vec<QueuedTarget>,
    cursor: usize,
}

impl TargetQueue {
    #[must_use]
    pub fn new(entries: Vec<QueuedTarget>) -> Self {
        Self { entries, cursor: 0 }
    }

    /// Number of targets not yet handed out.
    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Number of targets the queue was built with.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

impl FromIterator<QueuedTarget> for TargetQueue {
    fn from_iter<I: IntoIterator<Item = QueuedTarget>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Iterator for TargetQueue {
    type Item = QueuedTarget;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining_count();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TargetQueue {}

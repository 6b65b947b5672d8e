//! In-memory run log backend.

use std::collections::VecDeque;

use crate::core::{JobberError, Result, RunLog, RunLogEntry};
use crate::util::clock::Instant;

/// Bounded in-memory run log.
///
/// Entries are kept in ascending start-time order. Once full, each new entry
/// evicts the oldest one; an entry older than everything in a full log is
/// dropped instead.
pub struct InMemoryRunLog {
    entries: VecDeque<RunLogEntry>,
    max_len: usize,
}

impl InMemoryRunLog {
    /// Create a log holding at most `max_len` entries (at least one).
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            entries: VecDeque::with_capacity(max_len.min(1024)),
            max_len,
        }
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    fn newest_first<'a>(iter: impl DoubleEndedIterator<Item = &'a RunLogEntry>) -> Vec<RunLogEntry> {
        iter.rev().cloned().collect()
    }
}

impl RunLog for InMemoryRunLog {
    fn put(&mut self, entry: RunLogEntry) {
        if self.entries.len() >= self.max_len {
            if self
                .entries
                .front()
                .is_some_and(|oldest| entry.start < oldest.start)
            {
                return;
            }
            self.entries.pop_front();
        }

        // Usually appended in order; walk back from the end otherwise.
        let idx = self
            .entries
            .iter()
            .rposition(|e| e.start <= entry.start)
            .map_or(0, |i| i + 1);
        self.entries.insert(idx, entry);
    }

    fn get_from_time(&self, max_time: Instant, min_time: Option<Instant>) -> Result<Vec<RunLogEntry>> {
        if let Some(min) = min_time {
            if min > max_time {
                return Err(JobberError::InvalidRange(format!(
                    "min time {min} is after max time {max_time}"
                )));
            }
        }
        let lo = min_time.map_or(0, |min| self.entries.partition_point(|e| e.start <= min));
        let hi = self.entries.partition_point(|e| e.start <= max_time);
        Ok(Self::newest_first(self.entries.range(lo..hi.max(lo))))
    }

    fn get_from_index(&self, min_index: usize, max_index: Option<usize>) -> Result<Vec<RunLogEntry>> {
        let len = self.entries.len();
        let max_index = max_index.unwrap_or(len);
        if min_index > max_index {
            return Err(JobberError::InvalidRange(format!(
                "min index {min_index} > max index {max_index}"
            )));
        }
        if min_index >= len {
            return Err(JobberError::InvalidRange(format!(
                "invalid min index {min_index} for log of length {len}"
            )));
        }
        if max_index > len {
            return Err(JobberError::InvalidRange(format!(
                "invalid max index {max_index} for log of length {len}"
            )));
        }
        // Newest-first index i is ascending index len - 1 - i.
        Ok(Self::newest_first(self.entries.range(len - max_index..len - min_index)))
    }

    fn get_all(&self) -> Vec<RunLogEntry> {
        Self::newest_first(self.entries.iter())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

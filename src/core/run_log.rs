//! Run log abstraction: a time-ordered history of job runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{JobStatus, Result, RunFate, RunRec};
use crate::util::clock::Instant;

/// One run, as remembered by the run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLogEntry {
    /// Name of the job that ran.
    pub job_name: String,
    /// When the run started.
    pub start: Instant,
    /// How long it took.
    pub elapsed: Duration,
    /// How it ended.
    pub fate: RunFate,
    /// Job status after the run.
    pub result: JobStatus,
}

impl From<&RunRec> for RunLogEntry {
    fn from(rec: &RunRec) -> Self {
        Self {
            job_name: rec.job.name().to_owned(),
            start: rec.start,
            elapsed: rec.elapsed,
            fate: rec.fate,
            result: rec.new_status,
        }
    }
}

/// Append-mostly store of run entries. Queries return newest first.
pub trait RunLog: Send + Sync {
    /// Record a run.
    fn put(&mut self, entry: RunLogEntry);

    /// Entries that started after `min_time` (if given) and no later than
    /// `max_time`.
    fn get_from_time(&self, max_time: Instant, min_time: Option<Instant>) -> Result<Vec<RunLogEntry>>;

    /// Entries whose newest-first index is at least `min_index` and below
    /// `max_index` (or the end of the log).
    fn get_from_index(&self, min_index: usize, max_index: Option<usize>) -> Result<Vec<RunLogEntry>>;

    /// Every entry.
    fn get_all(&self) -> Vec<RunLogEntry>;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Whether the log is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

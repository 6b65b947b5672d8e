//! Run records: the outcome of one execution attempt.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Job, JobStatus};
use crate::util::clock::Instant;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunFate {
    /// The command exited with status 0.
    Succeeded,
    /// The command exited non-zero or could not be started.
    Failed,
    /// The run was cut short by cancellation.
    Cancelled,
}

impl fmt::Display for RunFate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        })
    }
}

/// Outcome of exactly one execution attempt.
#[derive(Debug, Clone)]
pub struct RunRec {
    /// The job that ran.
    pub job: Job,
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// When the run started.
    pub start: Instant,
    /// How long it took.
    pub elapsed: Duration,
    /// Captured standard output (bounded).
    pub stdout: Vec<u8>,
    /// Captured standard error (bounded).
    pub stderr: Vec<u8>,
    /// How it ended.
    pub fate: RunFate,
    /// Job status after the outcome was applied.
    pub new_status: JobStatus,
}

impl RunRec {
    /// A record whose `new_status` is the job's status at creation time.
    #[must_use]
    pub fn new(
        job: Job,
        start: Instant,
        elapsed: Duration,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        fate: RunFate,
    ) -> Self {
        let new_status = job.status();
        Self {
            job,
            run_id: Uuid::new_v4(),
            start,
            elapsed,
            stdout,
            stderr,
            fate,
            new_status,
        }
    }

    /// Replace the recorded post-run status.
    #[must_use]
    pub const fn with_new_status(mut self, status: JobStatus) -> Self {
        self.new_status = status;
        self
    }

    /// Whether the run succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.fate == RunFate::Succeeded
    }

    /// One-paragraph human summary.
    #[must_use]
    pub fn describe(&self) -> String {
        let summary = match self.fate {
            RunFate::Succeeded => "succeeded",
            RunFate::Failed => "failed",
            RunFate::Cancelled => "was cancelled",
        };
        format!(
            "Job \"{}\" {summary}.\nNew status: {}.\n\nStdout:\n{}\n\nStderr:\n{}",
            self.job.name(),
            self.new_status,
            String::from_utf8_lossy(&self.stdout),
            String::from_utf8_lossy(&self.stderr),
        )
    }
}

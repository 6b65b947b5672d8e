//! Administrative commands accepted by the job manager, and their replies.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::core::{ErrorHandler, Job, JobDef, JobStatus, Result, RunFate, RunLogEntry, RunRec};
use crate::util::clock::Instant;

/// A request to the manager loop, carrying its reply channel.
#[derive(Debug)]
pub enum Command {
    /// Re-read the job set; replies with the new job count.
    Reload {
        /// Reply channel.
        reply: oneshot::Sender<Result<usize>>,
    },
    /// Describe every job.
    ListJobs {
        /// Reply channel.
        reply: oneshot::Sender<Vec<JobDesc>>,
    },
    /// Recent runs, newest first, optionally for one job.
    Log {
        /// Restrict to this job.
        job: Option<String>,
        /// Reply channel.
        reply: oneshot::Sender<Result<Vec<LogDesc>>>,
    },
    /// Run a job now, outside the schedule, without touching its state.
    Test {
        /// Job to run.
        job: String,
        /// Reply channel.
        reply: oneshot::Sender<Result<RunRec>>,
    },
    /// A job's command text.
    Cat {
        /// Job to show.
        job: String,
        /// Reply channel.
        reply: oneshot::Sender<Result<String>>,
    },
    /// Pause the named jobs (all jobs if empty); replies with how many changed.
    Pause {
        /// Jobs to pause.
        jobs: Vec<String>,
        /// Reply channel.
        reply: oneshot::Sender<Result<usize>>,
    },
    /// Resume the named jobs (all jobs if empty); replies with how many changed.
    Resume {
        /// Jobs to resume.
        jobs: Vec<String>,
        /// Reply channel.
        reply: oneshot::Sender<Result<usize>>,
    },
    /// Add a job, or replace the job of the same name; replies with whether
    /// one was replaced. Other jobs keep their state.
    SetJob {
        /// The new job.
        job: JobDef,
        /// Reply channel.
        reply: oneshot::Sender<Result<bool>>,
    },
    /// Remove one job. Other jobs keep their state.
    DeleteJob {
        /// Job to remove.
        job: String,
        /// Reply channel.
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Listing entry for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDesc {
    /// Job name.
    pub name: String,
    /// Status text, with " (Paused)" appended for paused jobs.
    pub status: String,
    /// Schedule text, with drawn random values.
    pub schedule: String,
    /// Next due time; `None` when paused or unschedulable.
    pub next_run_time: Option<Instant>,
    /// Start of the most recent run.
    pub last_run_time: Option<Instant>,
    /// Failure strategy.
    pub error_handler: ErrorHandler,
    /// Sinks notified on error.
    pub notify_on_error: Vec<String>,
    /// Sinks notified on failure.
    pub notify_on_failure: Vec<String>,
    /// Sinks notified on success.
    pub notify_on_success: Vec<String>,
}

impl From<&Job> for JobDesc {
    fn from(job: &Job) -> Self {
        let state = job.state();
        let def = job.def();
        let status = if state.paused {
            format!("{} (Paused)", state.status)
        } else {
            state.status.to_string()
        };
        Self {
            name: def.name.clone(),
            status,
            schedule: def.time.to_string(),
            next_run_time: if state.paused { None } else { state.next_run_time },
            last_run_time: state.last_run_time,
            error_handler: def.error_handler,
            notify_on_error: def.notify.on_error_names(),
            notify_on_failure: def.notify.on_failure_names(),
            notify_on_success: def.notify.on_success_names(),
        }
    }
}

/// One run, as reported by the `Log` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDesc {
    /// Job name.
    pub job: String,
    /// Run start.
    pub start: Instant,
    /// How the run ended.
    pub fate: RunFate,
    /// Run duration.
    pub elapsed: Duration,
    /// Job status after the run.
    pub result: JobStatus,
}

impl From<RunLogEntry> for LogDesc {
    fn from(entry: RunLogEntry) -> Self {
        Self {
            job: entry.job_name,
            start: entry.start,
            fate: entry.fate,
            elapsed: entry.elapsed,
            result: entry.result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paused_job_desc() {
        let job = Job::parse("j", "u", "true", "0 0 14").unwrap();
        job.with_state(|s| s.next_run_time = Some(crate::util::clock::now()));
        job.set_paused(true);
        let desc = JobDesc::from(&job);
        assert_eq!(desc.status, "Good (Paused)");
        assert_eq!(desc.next_run_time, None);
        assert_eq!(desc.schedule, "0 0 14 * * *");
        assert_eq!(desc.error_handler, ErrorHandler::Continue);
    }
}

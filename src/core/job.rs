//! Jobs and their failure-handling state machine.
//!
//! A [`Job`] pairs an immutable [`JobDef`] (what to run and when) with a
//! small mutable [`JobState`]. Clones share both, so the scheduler queue, the
//! runner and the manager can all hold the same job; the manager is the only
//! component that applies run outcomes to the state.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::sink::ResultSink;
use crate::core::time_spec::FullTimeSpec;
use crate::core::{JobberError, Result, RunFate};
use crate::util::clock::Instant;

/// Largest number of consecutive skips the backoff handler will impose
/// before giving up on a job.
pub const MAX_BACKOFF_WAIT: u32 = 8;

/// Health of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum JobStatus {
    /// Running on schedule.
    #[default]
    Good,
    /// Skipping scheduled runs after recent failures.
    Backoff,
    /// Given up on; never scheduled again until reloaded.
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "Good",
            Self::Backoff => "Backoff",
            Self::Failed => "Failed",
        })
    }
}

/// Strategy applied to a job's state after a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ErrorHandler {
    /// Mark the job `Failed`.
    Stop,
    /// Skip 1, 2, 4, 8 scheduled runs after consecutive failures, then give up.
    Backoff,
    /// Ignore the failure.
    #[default]
    Continue,
}

impl ErrorHandler {
    /// Apply this strategy to `state` after a failed run.
    pub fn handle(self, state: &mut JobState) {
        match self {
            Self::Continue => state.status = JobStatus::Good,
            Self::Stop => state.status = JobStatus::Failed,
            Self::Backoff => {
                if state.status == JobStatus::Good {
                    state.status = JobStatus::Backoff;
                    state.backoff_level = 1;
                } else {
                    state.backoff_level = state.backoff_level.saturating_mul(2);
                }

                if state.backoff_level > MAX_BACKOFF_WAIT {
                    state.status = JobStatus::Failed;
                    state.backoff_level = 0;
                    state.skips_left = 0;
                } else {
                    state.skips_left = state.backoff_level;
                }
            }
        }
    }
}

impl fmt::Display for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stop => "Stop",
            Self::Backoff => "Backoff",
            Self::Continue => "Continue",
        })
    }
}

impl FromStr for ErrorHandler {
    type Err = JobberError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Stop" => Ok(Self::Stop),
            "Backoff" => Ok(Self::Backoff),
            "Continue" => Ok(Self::Continue),
            other => Err(JobberError::InvalidJobFile(format!(
                "invalid error handler: {other}"
            ))),
        }
    }
}

/// Mutable per-job state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobState {
    /// Current health.
    pub status: JobStatus,
    /// Number of scheduled runs to skip after the current failure streak.
    pub backoff_level: u32,
    /// Scheduled runs still to skip before the next attempt.
    pub skips_left: u32,
    /// Paused jobs stay scheduled but are not dispatched.
    pub paused: bool,
    /// Next due time, if any.
    pub next_run_time: Option<Instant>,
    /// Start time of the most recent run.
    pub last_run_time: Option<Instant>,
}

impl JobState {
    /// Decide whether a due occurrence should actually run.
    ///
    /// Called once per due occurrence. A job in `Backoff` skips
    /// `skips_left` occurrences and then runs.
    pub fn should_run(&mut self) -> bool {
        match self.status {
            JobStatus::Failed => false,
            JobStatus::Backoff if self.skips_left > 0 => {
                self.skips_left -= 1;
                false
            }
            JobStatus::Backoff | JobStatus::Good => true,
        }
    }

    /// Apply the outcome of a run that started at `start`.
    ///
    /// Success resets the job to `Good`, failure goes through `handler`, and
    /// a cancelled run leaves the status alone.
    pub fn apply(&mut self, handler: ErrorHandler, fate: RunFate, start: Instant) -> JobStatus {
        match fate {
            RunFate::Succeeded => {
                self.status = JobStatus::Good;
                self.backoff_level = 0;
                self.skips_left = 0;
            }
            RunFate::Failed => handler.handle(self),
            RunFate::Cancelled => {}
        }
        self.last_run_time = Some(start);
        self.status
    }
}

/// Result sinks to notify per outcome.
#[derive(Clone, Default)]
pub struct NotifySinks {
    /// Notified when a run fails.
    pub on_error: Vec<Arc<dyn ResultSink>>,
    /// Notified when a run leaves the job `Failed`.
    pub on_failure: Vec<Arc<dyn ResultSink>>,
    /// Notified when a run succeeds.
    pub on_success: Vec<Arc<dyn ResultSink>>,
}

fn sink_names(sinks: &[Arc<dyn ResultSink>]) -> Vec<String> {
    sinks.iter().map(|s| s.name().to_owned()).collect()
}

impl NotifySinks {
    /// Names of the error sinks.
    #[must_use]
    pub fn on_error_names(&self) -> Vec<String> {
        sink_names(&self.on_error)
    }

    /// Names of the failure sinks.
    #[must_use]
    pub fn on_failure_names(&self) -> Vec<String> {
        sink_names(&self.on_failure)
    }

    /// Names of the success sinks.
    #[must_use]
    pub fn on_success_names(&self) -> Vec<String> {
        sink_names(&self.on_success)
    }
}

impl fmt::Debug for NotifySinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifySinks")
            .field("on_error", &self.on_error_names())
            .field("on_failure", &self.on_failure_names())
            .field("on_success", &self.on_success_names())
            .finish()
    }
}

/// Immutable description of a job.
#[derive(Debug, Clone)]
pub struct JobDef {
    /// Unique name within the owner's job set.
    pub name: String,
    /// Owning user.
    pub user: String,
    /// Shell command.
    pub cmd: String,
    /// Schedule.
    pub time: FullTimeSpec,
    /// What to do after a failed run.
    pub error_handler: ErrorHandler,
    /// Who hears about outcomes.
    pub notify: NotifySinks,
}

impl JobDef {
    /// A job with the `Continue` handler and no sinks.
    pub fn new(
        name: impl Into<String>,
        user: impl Into<String>,
        cmd: impl Into<String>,
        time: FullTimeSpec,
    ) -> Self {
        Self {
            name: name.into(),
            user: user.into(),
            cmd: cmd.into(),
            time,
            error_handler: ErrorHandler::default(),
            notify: NotifySinks::default(),
        }
    }

    /// Set the error handler.
    #[must_use]
    pub const fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = handler;
        self
    }

    /// Set the notification sinks.
    #[must_use]
    pub fn with_notify(mut self, notify: NotifySinks) -> Self {
        self.notify = notify;
        self
    }
}

/// A schedulable job: shared definition plus shared mutable state.
#[derive(Clone)]
pub struct Job {
    def: Arc<JobDef>,
    state: Arc<Mutex<JobState>>,
}

impl Job {
    /// Wrap `def` in a fresh `Good` job, drawing any random schedule fields.
    #[must_use]
    pub fn new(def: JobDef) -> Self {
        def.time.derandomize();
        Self {
            def: Arc::new(def),
            state: Arc::new(Mutex::new(JobState::default())),
        }
    }

    /// Parse `time` and build a job with default handler and sinks.
    pub fn parse(
        name: impl Into<String>,
        user: impl Into<String>,
        cmd: impl Into<String>,
        time: &str,
    ) -> Result<Self> {
        Ok(Self::new(JobDef::new(name, user, cmd, FullTimeSpec::parse(time)?)))
    }

    /// The immutable definition.
    #[must_use]
    pub fn def(&self) -> &JobDef {
        &self.def
    }

    /// Job name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Shell command.
    #[must_use]
    pub fn cmd(&self) -> &str {
        &self.def.cmd
    }

    /// Schedule.
    #[must_use]
    pub fn time(&self) -> &FullTimeSpec {
        &self.def.time
    }

    /// Snapshot of the mutable state.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.state.lock().clone()
    }

    /// Run `f` with the state locked.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut JobState) -> R) -> R {
        f(&mut self.state.lock())
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.state.lock().status
    }

    /// Whether the job is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    /// Set the paused flag; returns whether it changed.
    pub fn set_paused(&self, paused: bool) -> bool {
        let mut state = self.state.lock();
        let changed = state.paused != paused;
        state.paused = paused;
        changed
    }

    /// Next due time, if scheduled.
    #[must_use]
    pub fn next_run_time(&self) -> Option<Instant> {
        self.state.lock().next_run_time
    }

    /// See [`JobState::should_run`].
    pub fn should_run(&self) -> bool {
        self.state.lock().should_run()
    }

    /// Apply a run outcome; returns the resulting status.
    pub fn apply_run(&self, fate: RunFate, start: Instant) -> JobStatus {
        self.state
            .lock()
            .apply(self.def.error_handler, fate, start)
    }

    /// Whether two handles refer to the same job.
    #[must_use]
    pub fn same_job(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.def.name)
            .field("time", &self.def.time.to_string())
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.def.name)
    }
}

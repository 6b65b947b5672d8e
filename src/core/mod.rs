//! Core scheduling engine: schedules, jobs, queue, cancellation, runner and
//! manager.

pub mod command;
pub mod context;
pub mod error;
pub mod executor;
pub mod job;
pub mod loader;
pub mod manager;
pub mod next_run;
pub mod queue;
pub mod run_log;
pub mod run_rec;
pub mod runner;
pub mod sink;
pub mod time_spec;

pub use command::{Command, JobDesc, LogDesc};
pub use context::{Context, ContextCtl};
pub use error::{AppResult, JobberError, Result};
pub use executor::{ExecOutput, JobExecutor};
pub use job::{ErrorHandler, Job, JobDef, JobState, JobStatus, NotifySinks, MAX_BACKOFF_WAIT};
pub use loader::{JobLoader, StaticJobLoader};
pub use manager::JobManager;
pub use next_run::{next_run_time, next_run_time_brute_force};
pub use queue::JobQueue;
pub use run_log::{RunLog, RunLogEntry};
pub use run_rec::{RunFate, RunRec};
pub use runner::{run_job, JobRunner};
pub use sink::ResultSink;
pub use time_spec::{parse_field, Field, FullTimeSpec, TimeSpec};

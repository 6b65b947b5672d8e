//! # Jobber
//!
//! A per-user job scheduler in the spirit of cron.
//!
//! Jobs pair a shell command with a six-field schedule (second, minute, hour,
//! day of month, month, day of week). A single manager task owns every job's
//! state: it keeps the jobs in a queue ordered by next run time, runs each due
//! job to completion, applies the job's error handler to the outcome and
//! reports the run to its result sinks.
//!
//! ## Schedules
//!
//! Each field accepts `*`, `*/n`, a number, a comma list of numbers and
//! ranges, or `R`/`Ra-b` for a value picked at random once per load:
//!
//! ```rust
//! use jobber::core::FullTimeSpec;
//!
//! let spec: FullTimeSpec = "0 */15 9-17 * * 1-5".parse().unwrap();
//! assert_eq!(spec.to_string(), "0 */15 9-17 * * 1-5");
//! ```
//!
//! ## Error handlers
//!
//! - `Stop`: a failed run marks the job `Failed` and it never runs again.
//! - `Backoff`: after a failure the job skips 1, 2, 4 then 8 scheduled runs;
//!   the fifth consecutive failure marks it `Failed`.
//! - `Continue`: failures are reported and the schedule is unchanged.
//!
//! ## Running a manager
//!
//! ```rust,ignore
//! use jobber::builders::build_manager;
//! use jobber::config::DaemonConfig;
//!
//! let cfg = DaemonConfig::from_env()?;
//! let handle = build_manager(&cfg)?.launch();
//! for job in handle.list_jobs().await? {
//!     println!("{} {}", job.name, job.status);
//! }
//! handle.stop();
//! handle.wait().await;
//! ```
//!
//! Cancellation flows through a tree of [`core::Context`]s: stopping the
//! manager cancels its runner, which cancels the in-flight job, and every
//! level waits for its children before reporting finished.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling engine: schedules, jobs, queue, cancellation and manager.
pub mod core;
/// Daemon configuration and the YAML job file.
pub mod config;
/// Builders to construct the scheduler from configuration.
pub mod builders;
/// Infrastructure adapters for run-log storage and result sinks.
pub mod infra;
/// Process executor and the manager client API.
pub mod runtime;
/// Shared utilities: clock, output capture and tracing setup.
pub mod util;

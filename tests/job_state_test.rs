//! Integration tests for error handlers and the backoff state machine.

use chrono::{Local, TimeZone};

use jobber::core::{ErrorHandler, Job, JobDef, JobState, JobStatus, RunFate, MAX_BACKOFF_WAIT};
use jobber::util::Instant;

fn start() -> Instant {
    Local.with_ymd_and_hms(2016, 1, 1, 12, 0, 0).unwrap()
}

fn job(handler: ErrorHandler) -> Job {
    let def = JobDef::new("j", "u", "false", "".parse().unwrap()).with_error_handler(handler);
    Job::new(def)
}

/// Feed `occurrences` due occurrences to `job`, failing every run, and return
/// the 1-based occurrences that actually ran.
fn run_failing(job: &Job, occurrences: u32) -> Vec<u32> {
    let mut ran = Vec::new();
    for occurrence in 1..=occurrences {
        if job.should_run() {
            ran.push(occurrence);
            job.apply_run(RunFate::Failed, start());
        }
    }
    ran
}

#[test]
fn test_backoff_skips_double_then_fail() {
    let job = job(ErrorHandler::Backoff);
    let ran = run_failing(&job, 40);
    // Skips of 1, 2, 4 and 8 between attempts; the fifth failure gives up.
    assert_eq!(ran, [1, 3, 6, 11, 20]);
    assert_eq!(job.status(), JobStatus::Failed);
    assert!(!job.should_run());
}

#[test]
fn test_backoff_levels() {
    let mut state = JobState::default();
    let mut levels = Vec::new();
    for _ in 0..4 {
        state.apply(ErrorHandler::Backoff, RunFate::Failed, start());
        assert_eq!(state.status, JobStatus::Backoff);
        assert_eq!(state.skips_left, state.backoff_level);
        levels.push(state.backoff_level);
    }
    assert_eq!(levels, [1, 2, 4, MAX_BACKOFF_WAIT]);
    state.apply(ErrorHandler::Backoff, RunFate::Failed, start());
    assert_eq!(state.status, JobStatus::Failed);
}

#[test]
fn test_success_resets_backoff() {
    let job = job(ErrorHandler::Backoff);
    assert!(job.should_run());
    job.apply_run(RunFate::Failed, start());
    job.apply_run(RunFate::Failed, start());
    assert_eq!(job.state().backoff_level, 2);

    assert_eq!(job.apply_run(RunFate::Succeeded, start()), JobStatus::Good);
    let state = job.state();
    assert_eq!((state.backoff_level, state.skips_left), (0, 0));
    assert!(job.should_run());

    // The streak starts over.
    job.apply_run(RunFate::Failed, start());
    assert_eq!(job.state().backoff_level, 1);
}

#[test]
fn test_stop_fails_on_first_error() {
    let job = job(ErrorHandler::Stop);
    assert_eq!(run_failing(&job, 10), [1]);
    assert_eq!(job.status(), JobStatus::Failed);
}

#[test]
fn test_continue_never_skips() {
    let job = job(ErrorHandler::Continue);
    assert_eq!(run_failing(&job, 10), (1..=10).collect::<Vec<_>>());
    assert_eq!(job.status(), JobStatus::Good);
}

#[test]
fn test_cancelled_run_keeps_status_but_records_time() {
    let job = job(ErrorHandler::Backoff);
    job.apply_run(RunFate::Failed, start());
    let before = job.state();
    let later = start() + chrono::Duration::minutes(5);
    assert_eq!(job.apply_run(RunFate::Cancelled, later), JobStatus::Backoff);
    let after = job.state();
    assert_eq!(after.backoff_level, before.backoff_level);
    assert_eq!(after.skips_left, before.skips_left);
    assert_eq!(after.last_run_time, Some(later));
}

#[test]
fn test_clones_share_state() {
    let job = job(ErrorHandler::Stop);
    let other = job.clone();
    job.apply_run(RunFate::Failed, start());
    assert_eq!(other.status(), JobStatus::Failed);
    assert!(job.same_job(&other));

    let reloaded = Job::new(job.def().clone());
    assert!(!reloaded.same_job(&job));
    assert_eq!(reloaded.status(), JobStatus::Good);
}

#[test]
fn test_error_handler_names() {
    for handler in [ErrorHandler::Stop, ErrorHandler::Backoff, ErrorHandler::Continue] {
        assert_eq!(handler.to_string().parse::<ErrorHandler>().unwrap(), handler);
    }
    assert!("stop".parse::<ErrorHandler>().is_err());
    assert_eq!(ErrorHandler::default(), ErrorHandler::Continue);
}

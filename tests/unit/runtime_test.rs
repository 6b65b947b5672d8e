//! Tests for the process executor and job listing output

use chrono::{Local, TimeZone};

use jobber::core::{Context, ErrorHandler, JobDesc, JobExecutor, RunFate};
use jobber::runtime::{format_job_table, ShellExecutor, DEFAULT_SHELL};

#[test]
fn test_shell_executor_defaults() {
    let exec = ShellExecutor::default();
    assert_eq!(exec.shell(), DEFAULT_SHELL);
    assert_eq!(ShellExecutor::new("/bin/bash").shell(), "/bin/bash");
}

#[tokio::test]
async fn test_shell_executor_runs_pipelines() {
    let (ctx, _) = Context::root("shell");
    let exec = ShellExecutor::default();
    let out = exec
        .exec_and_wait("printf 'a\\nb\\n' | wc -l | tr -d ' '", &ctx)
        .await
        .unwrap();
    assert_eq!(out.fate, RunFate::Succeeded);
    assert_eq!(out.stdout, b"2\n");
    ctx.finish().await;
}

#[test]
fn test_job_table_shows_next_run_time() {
    let next = Local.with_ymd_and_hms(2016, 1, 4, 14, 0, 0).unwrap();
    let jobs = vec![
        JobDesc {
            name: "Backup".into(),
            status: "Good".into(),
            schedule: "0 0 14 * * 1".into(),
            next_run_time: Some(next),
            last_run_time: None,
            error_handler: ErrorHandler::Stop,
            notify_on_error: vec![],
            notify_on_failure: vec![],
            notify_on_success: vec![],
        },
        JobDesc {
            name: "Sync".into(),
            status: "Good (Paused)".into(),
            schedule: "*/5 * * * * *".into(),
            next_run_time: None,
            last_run_time: None,
            error_handler: ErrorHandler::Continue,
            notify_on_error: vec![],
            notify_on_failure: vec![],
            notify_on_success: vec![],
        },
    ];
    let table = format_job_table(&jobs);
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains("Jan 4 14:00:00"));
    assert!(lines[2].contains("none"));
    assert!(lines[2].contains("Good (Paused)"));
}

//! Tests for builder modules

use std::io::Write;
use std::time::Duration;

use jobber::builders::build_manager;
use jobber::config::DaemonConfig;
use jobber::core::RunFate;

fn config(job_file: &std::path::Path) -> DaemonConfig {
    DaemonConfig {
        job_file: job_file.to_path_buf(),
        user: "erin".into(),
        test_timeout_secs: 5,
        ..DaemonConfig::default()
    }
}

#[tokio::test]
async fn test_build_manager_from_job_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "jobs:\n  Greet:\n    cmd: echo hi\n    time: 0 0 0 29 2\n    onError: Backoff"
    )
    .unwrap();

    let handle = build_manager(&config(file.path())).unwrap().launch();
    let jobs = handle.list_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].name, "Greet");
    assert_eq!(jobs[0].error_handler.to_string(), "Backoff");

    let rec = handle.test("Greet").await.unwrap();
    assert_eq!(rec.fate, RunFate::Succeeded);
    assert_eq!(rec.stdout, b"hi\n");
    assert_eq!(rec.job.def().user, "erin");

    handle.stop();
    tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_build_manager_with_missing_job_file() {
    let dir = tempfile::tempdir().unwrap();
    let handle = build_manager(&config(&dir.path().join("absent.yaml")))
        .unwrap()
        .launch();
    assert!(handle.list_jobs().await.unwrap().is_empty());
    handle.stop();
    handle.wait().await;
}

#[test]
fn test_build_manager_rejects_empty_shell() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = DaemonConfig {
        shell: String::new(),
        ..config(dir.path())
    };
    assert!(build_manager(&cfg).is_err());
}

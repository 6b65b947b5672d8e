//! Tests for result sinks and the run-record document

use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use jobber::core::{Job, JobStatus, ResultSink, RunFate, RunRec};
use jobber::infra::sink::{run_rec_json, run_rec_line, SinkData, RUN_REC_FORMAT_VERSION};
use jobber::infra::{FilesystemResultSink, ProgramResultSink, StdoutResultSink};
use jobber::util::{now, unix_secs};

fn rec(fate: RunFate, stderr: &[u8]) -> RunRec {
    let job = Job::parse("Report", "frank", "make report", "0 0 9").unwrap();
    RunRec::new(
        job,
        now(),
        Duration::from_millis(1500),
        b"all good".to_vec(),
        stderr.to_vec(),
        fate,
    )
    .with_new_status(JobStatus::Backoff)
}

#[test]
fn test_run_rec_document() {
    let rec = rec(RunFate::Failed, &[0x00, 0xff]);
    let doc = run_rec_json(&rec, SinkData::ALL);
    assert_eq!(doc["version"], RUN_REC_FORMAT_VERSION);
    assert_eq!(doc["job"]["status"], "Backoff");
    assert_eq!(doc["succeeded"], false);
    assert_eq!(doc["fate"], "Failed");
    assert_eq!(doc["runId"], rec.run_id.to_string());
    assert_eq!(doc["startTime"], unix_secs(&rec.start));
    assert_eq!(doc["stdout"], "all good");
    assert_eq!(doc["stderrBase64"], "AP8=");

    let bare = run_rec_json(&rec, SinkData::default());
    assert!(bare.get("stdout").is_none());
    assert!(bare.get("stderrBase64").is_none());
}

#[test]
fn test_run_rec_line_is_one_line() {
    let line = run_rec_line(&rec(RunFate::Succeeded, b"multi\nline"), SinkData::ALL);
    assert_eq!(line.last(), Some(&b'\n'));
    assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);
    let doc: serde_json::Value = serde_json::from_slice(&line).unwrap();
    assert_eq!(doc["stderr"], "multi\nline");
}

#[tokio::test]
async fn test_program_sink_receives_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("received.json");
    let script = dir.path().join("notify.sh");
    std::fs::write(&script, format!("#!/bin/sh\ncat > '{}'\n", out.display())).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let sink = ProgramResultSink::new(&script);
    assert_eq!(sink.name(), "program");
    let rec = rec(RunFate::Succeeded, b"");
    sink.handle(&rec).await;

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["job"]["name"], "Report");
    assert_eq!(doc["user"], "frank");
    assert_eq!(doc["stdout"], "all good");
}

#[tokio::test]
async fn test_program_sink_tolerates_missing_program() {
    let sink = ProgramResultSink::new("/no/such/program");
    sink.handle(&rec(RunFate::Failed, b"")).await;
}

#[tokio::test]
async fn test_filesystem_sink_writes_selected_streams() {
    let dir = tempfile::tempdir().unwrap();
    let data = SinkData {
        stdout: true,
        stderr: false,
    };
    let sink = FilesystemResultSink::new(dir.path(), data, 30).unwrap();
    let rec = rec(RunFate::Succeeded, b"ignored");
    sink.handle(&rec).await;

    let stamp = unix_secs(&rec.start);
    let job_dir = dir.path().join("Report");
    assert_eq!(
        std::fs::read(job_dir.join(format!("{stamp}.stdout"))).unwrap(),
        b"all good"
    );
    assert!(!job_dir.join(format!("{stamp}.stderr")).exists());
}

#[tokio::test]
async fn test_stdout_sink() {
    let sink = StdoutResultSink::new(SinkData::ALL);
    assert_eq!(sink.name(), "stdout");
    sink.handle(&rec(RunFate::Succeeded, b"")).await;
}

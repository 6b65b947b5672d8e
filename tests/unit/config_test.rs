//! Tests for daemon configuration and job file loading

use std::io::Write;

use jobber::config::{parse_job_file, DaemonConfig, SinkConfig, YamlJobFileLoader};
use jobber::core::{ErrorHandler, JobLoader, TimeSpec};
use jobber::infra::sink::SinkData;

#[test]
fn test_daemon_config_validation() {
    let valid = DaemonConfig {
        user: "alice".into(),
        ..DaemonConfig::default()
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_daemon_config_invalid_user() {
    let invalid = DaemonConfig {
        user: "  ".into(),
        ..DaemonConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_daemon_config_invalid_output_cap() {
    let invalid = DaemonConfig {
        user: "alice".into(),
        max_output_bytes: 0,
        ..DaemonConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_daemon_config_from_json() {
    let cfg = DaemonConfig::from_json_str(
        r#"{"job_file": "/etc/jobs.yaml", "user": "alice", "shell": "/bin/bash", "kill_on_cancel": true}"#,
    )
    .unwrap();
    assert_eq!(cfg.shell, "/bin/bash");
    assert!(cfg.kill_on_cancel);
    assert!(DaemonConfig::from_json_str("not json").is_err());
}

#[test]
fn test_sink_config_parsing() {
    let sinks: Vec<SinkConfig> = serde_yaml::from_str(
        r"
- type: stdout
  data: [stdout]
- type: filesystem
  path: /var/jobber
  maxAgeDays: 7
",
    )
    .unwrap();
    assert_eq!(
        sinks[0],
        SinkConfig::Stdout {
            data: SinkData {
                stdout: true,
                stderr: false
            }
        }
    );
    assert_eq!(
        sinks[1],
        SinkConfig::Filesystem {
            path: "/var/jobber".into(),
            data: SinkData::default(),
            max_age_days: 7,
        }
    );
    assert!(serde_yaml::from_str::<SinkConfig>("{type: stdout, data: [stdin]}").is_err());
    assert!(serde_yaml::from_str::<SinkConfig>("{type: program}").is_err());
}

#[test]
fn test_job_file_full_example() {
    let jobs = parse_job_file(
        r"
version: 1.4
resultSinks:
  - &out {type: stdout, data: [stdout, stderr]}
jobs:
  Nightly:
    cmd: ./nightly.sh
    time: 0 30 2 * * 1-5
    onError: Stop
    notifyOnSuccess: [*out]
  Jitter:
    cmd: ping -c1 host
    time: R0-29 R
",
        "carol",
    )
    .unwrap();
    assert_eq!(jobs.len(), 2);

    let jitter = jobs[0].def();
    assert_eq!(jitter.name, "Jitter");
    assert!(jitter.time.sec.is_random());
    // Random fields are drawn as soon as the job is built.
    assert!(jitter.time.sec.picked_value().is_some_and(|v| v < 30));
    assert!(jitter.time.min.picked_value().is_some());

    let nightly = jobs[1].def();
    assert_eq!(nightly.error_handler, ErrorHandler::Stop);
    assert_eq!(nightly.time.hour, TimeSpec::One(2));
    assert_eq!(nightly.notify.on_success_names(), ["stdout"]);
}

#[test]
fn test_loader_reads_file_each_time() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "jobs:\n  A:\n    cmd: echo a").unwrap();
    let loader = YamlJobFileLoader::new(file.path(), "dave");
    let first = loader.load().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].def().user, "dave");

    writeln!(file, "  B:\n    cmd: echo b").unwrap();
    let second = loader.load().unwrap();
    assert_eq!(second.len(), 2);
    assert!(!second[0].same_job(&first[0]));
}

#[test]
fn test_loader_reports_bad_yaml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "jobs: [this, is, a, list]").unwrap();
    let loader = YamlJobFileLoader::new(file.path(), "dave");
    assert!(loader.load().is_err());
}

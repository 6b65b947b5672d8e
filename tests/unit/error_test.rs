//! Tests for error types

use jobber::core::{FullTimeSpec, JobberError};

#[test]
fn test_no_such_jobs_error() {
    let err = JobberError::NoSuchJobs(vec!["backup".into()]);
    assert_eq!(format!("{}", err), "no such jobs: backup");
}

#[test]
fn test_manager_stopped_error() {
    assert_eq!(format!("{}", JobberError::ManagerStopped), "job manager stopped");
}

#[test]
fn test_invalid_range_error() {
    let err = JobberError::InvalidRange("min index 3 > max index 1".into());
    assert_eq!(format!("{}", err), "invalid range: min index 3 > max index 1");
}

#[test]
fn test_time_spec_error_from_parse() {
    let err = FullTimeSpec::parse("0 61").unwrap_err();
    assert_eq!(
        format!("{}", err),
        "invalid minute spec '61': value 61 out of range [0, 59]"
    );
}

#[test]
fn test_yaml_error_converts() {
    let yaml_err = serde_yaml::from_str::<Vec<u32>>("{not: a list}").unwrap_err();
    let err = JobberError::from(yaml_err);
    assert!(format!("{}", err).starts_with("job file parse error:"));
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
    let err: JobberError = io.into();
    assert_eq!(format!("{}", err), "io error: nope");
}

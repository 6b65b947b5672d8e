//! Tests for the in-memory run log

use std::time::Duration;

use chrono::{Local, TimeZone};

use jobber::core::{JobStatus, JobberError, RunFate, RunLog, RunLogEntry};
use jobber::infra::InMemoryRunLog;
use jobber::util::Instant;

fn at(min: u32) -> Instant {
    Local.with_ymd_and_hms(2016, 1, 1, 12, min, 0).unwrap()
}

fn entry(job: &str, min: u32) -> RunLogEntry {
    RunLogEntry {
        job_name: job.into(),
        start: at(min),
        elapsed: Duration::from_secs(1),
        fate: RunFate::Succeeded,
        result: JobStatus::Good,
    }
}

fn starts(entries: &[RunLogEntry]) -> Vec<Instant> {
    entries.iter().map(|e| e.start).collect()
}

#[test]
fn test_out_of_order_puts_are_sorted() {
    let mut log = InMemoryRunLog::new(10);
    for min in [5, 1, 3, 4, 2] {
        log.put(entry("j", min));
    }
    assert_eq!(starts(&log.get_all()), [at(5), at(4), at(3), at(2), at(1)]);
}

#[test]
fn test_capacity_evicts_oldest() {
    let mut log = InMemoryRunLog::new(3);
    for min in 1..=5 {
        log.put(entry("j", min));
    }
    assert_eq!(log.len(), 3);
    assert_eq!(starts(&log.get_all()), [at(5), at(4), at(3)]);

    // Older than everything kept: dropped.
    log.put(entry("j", 0));
    assert_eq!(starts(&log.get_all()), [at(5), at(4), at(3)]);
}

#[test]
fn test_get_from_time() {
    let mut log = InMemoryRunLog::new(10);
    for min in 1..=5 {
        log.put(entry("j", min));
    }
    let got = log.get_from_time(at(4), Some(at(1))).unwrap();
    assert_eq!(starts(&got), [at(4), at(3), at(2)]);
    let got = log.get_from_time(at(2), None).unwrap();
    assert_eq!(starts(&got), [at(2), at(1)]);
    assert!(matches!(
        log.get_from_time(at(1), Some(at(2))),
        Err(JobberError::InvalidRange(_))
    ));
}

#[test]
fn test_get_from_index() {
    let mut log = InMemoryRunLog::new(10);
    for min in 1..=5 {
        log.put(entry("j", min));
    }
    let got = log.get_from_index(1, Some(3)).unwrap();
    assert_eq!(starts(&got), [at(4), at(3)]);
    let got = log.get_from_index(3, None).unwrap();
    assert_eq!(starts(&got), [at(2), at(1)]);
    assert!(log.get_from_index(5, None).is_err());
    assert!(log.get_from_index(2, Some(1)).is_err());
    assert!(log.get_from_index(0, Some(6)).is_err());
}

#[test]
fn test_empty_log() {
    let log = InMemoryRunLog::new(0);
    assert_eq!(log.max_len(), 1);
    assert!(log.is_empty());
    assert!(log.get_all().is_empty());
    assert!(log.get_from_index(0, None).is_err());
}

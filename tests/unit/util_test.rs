//! Tests for utility functions

use std::time::Duration;

use chrono::{Local, TimeZone};

use jobber::util::{read_bounded, unix_secs, until, whole_seconds, OutputText};

#[test]
fn test_unix_secs() {
    let t = chrono::Utc
        .with_ymd_and_hms(2018, 3, 17, 20, 25, 51)
        .unwrap()
        .with_timezone(&Local);
    assert_eq!(unix_secs(&t), 1_521_318_351);
}

#[test]
fn test_whole_seconds_and_until() {
    let t = Local.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
    let fuzzy = t + chrono::Duration::milliseconds(999);
    assert_eq!(whole_seconds(fuzzy), t);
    assert_eq!(until(t, fuzzy), Duration::from_millis(999));
    assert_eq!(until(fuzzy, t), Duration::ZERO);
}

#[test]
fn test_output_text() {
    assert_eq!(OutputText::from_bytes(b""), OutputText::Utf8(String::new()));
    assert!(matches!(OutputText::from_bytes(&[0x80]), OutputText::Base64(_)));
}

#[tokio::test]
async fn test_read_bounded_zero_limit_drains() {
    let data = vec![7_u8; 50_000];
    let mut reader: &[u8] = &data;
    let kept = read_bounded(&mut reader, 0).await.unwrap();
    assert!(kept.is_empty());
    assert!(reader.is_empty());
}

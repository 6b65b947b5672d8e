//! Result sink backends and the run-record JSON format they share.

pub mod filesystem;
pub mod memory;
pub mod program;
pub mod stdout;

pub use filesystem::FilesystemResultSink;
pub use memory::InMemoryResultSink;
pub use program::ProgramResultSink;
pub use stdout::StdoutResultSink;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::core::RunRec;
use crate::util::clock::unix_secs;
use crate::util::output::OutputText;

/// Version of the run-record JSON document.
pub const RUN_REC_FORMAT_VERSION: &str = "1.4";

/// Which captured streams a sink includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SinkData {
    /// Include stdout.
    pub stdout: bool,
    /// Include stderr.
    pub stderr: bool,
}

impl SinkData {
    /// Both streams.
    pub const ALL: Self = Self {
        stdout: true,
        stderr: true,
    };
}

impl<'de> Deserialize<'de> for SinkData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let mut data = Self::default();
        for name in names {
            match name.to_lowercase().as_str() {
                "stdout" => data.stdout = true,
                "stderr" => data.stderr = true,
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "invalid data value: \"{other}\""
                    )))
                }
            }
        }
        Ok(data)
    }
}

fn put_output(doc: &mut Map<String, Value>, key: &str, bytes: &[u8]) {
    match OutputText::from_bytes(bytes) {
        OutputText::Utf8(text) => doc.insert(key.to_owned(), Value::String(text)),
        OutputText::Base64(enc) => doc.insert(format!("{key}Base64"), Value::String(enc)),
    };
}

/// Build the run-record JSON document for `rec`.
#[must_use]
pub fn run_rec_json(rec: &RunRec, data: SinkData) -> Value {
    let def = rec.job.def();
    let mut doc = Map::new();
    doc.insert("version".into(), json!(RUN_REC_FORMAT_VERSION));
    doc.insert(
        "job".into(),
        json!({
            "name": def.name,
            "command": def.cmd,
            "time": def.time.to_string(),
            "status": rec.new_status.to_string(),
        }),
    );
    doc.insert("user".into(), json!(def.user));
    doc.insert("runId".into(), json!(rec.run_id.to_string()));
    doc.insert("startTime".into(), json!(unix_secs(&rec.start)));
    doc.insert("succeeded".into(), json!(rec.succeeded()));
    doc.insert("fate".into(), json!(rec.fate.to_string()));
    if data.stdout {
        put_output(&mut doc, "stdout", &rec.stdout);
    }
    if data.stderr {
        put_output(&mut doc, "stderr", &rec.stderr);
    }
    Value::Object(doc)
}

/// [`run_rec_json`] serialized as one newline-terminated line.
#[must_use]
pub fn run_rec_line(rec: &RunRec, data: SinkData) -> Vec<u8> {
    let mut line = run_rec_json(rec, data).to_string().into_bytes();
    line.push(b'\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Job, JobStatus, RunFate};
    use std::time::Duration;

    fn rec(stdout: &[u8]) -> RunRec {
        let job = Job::parse("backup", "alice", "backup daily", "0 0 14").unwrap();
        RunRec::new(
            job,
            crate::util::clock::now(),
            Duration::from_secs(1),
            stdout.to_vec(),
            b"warn".to_vec(),
            RunFate::Succeeded,
        )
        .with_new_status(JobStatus::Good)
    }

    #[test]
    fn test_run_rec_json_fields() {
        let doc = run_rec_json(&rec(b"done"), SinkData::ALL);
        assert_eq!(doc["version"], "1.4");
        assert_eq!(doc["job"]["name"], "backup");
        assert_eq!(doc["job"]["command"], "backup daily");
        assert_eq!(doc["job"]["time"], "0 0 14 * * *");
        assert_eq!(doc["job"]["status"], "Good");
        assert_eq!(doc["user"], "alice");
        assert_eq!(doc["succeeded"], true);
        assert_eq!(doc["stdout"], "done");
        assert_eq!(doc["stderr"], "warn");
    }

    #[test]
    fn test_binary_output_is_base64() {
        let doc = run_rec_json(&rec(&[0xff, 0xfe]), SinkData { stdout: true, stderr: false });
        assert!(doc.get("stdout").is_none());
        assert_eq!(doc["stdoutBase64"], "//4=");
        assert!(doc.get("stderr").is_none());
    }

    #[test]
    fn test_sink_data_from_yaml() {
        let data: SinkData = serde_yaml::from_str("[stdout, STDERR]").unwrap();
        assert_eq!(data, SinkData::ALL);
        assert!(serde_yaml::from_str::<SinkData>("[stdin]").is_err());
    }
}

//! Result sink that pipes run records to an external program.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

use super::{run_rec_line, SinkData};
use crate::core::{ResultSink, RunRec};

/// Runs `path` once per record, with the run-record JSON on its stdin.
#[derive(Debug, Clone)]
pub struct ProgramResultSink {
    path: PathBuf,
}

impl ProgramResultSink {
    /// Sink invoking the program at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn deliver(&self, payload: &[u8]) -> std::io::Result<std::process::Output> {
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(payload).await?;
        }
        child.wait_with_output().await
    }
}

#[async_trait]
impl ResultSink for ProgramResultSink {
    fn name(&self) -> &str {
        "program"
    }

    async fn handle(&self, rec: &RunRec) {
        let payload = run_rec_line(rec, SinkData::ALL);
        match self.deliver(&payload).await {
            Err(err) => warn!(program = %self.path.display(), error = %err, "failed to call program"),
            Ok(out) if !out.status.success() => warn!(
                program = %self.path.display(),
                status = %out.status,
                stderr = %String::from_utf8_lossy(&out.stderr),
                "program failed"
            ),
            Ok(out) => info!(
                program = %self.path.display(),
                stdout = %String::from_utf8_lossy(&out.stdout),
                "program handled run record"
            ),
        }
    }
}

//! Shell-based job executor.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::core::{Context, ExecOutput, JobExecutor, JobberError, Result, RunFate};
use crate::util::output::{read_bounded, DEFAULT_MAX_OUTPUT_BYTES};

/// Default shell used to run job commands.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Runs each command as `<shell> -c <command>`.
///
/// Stdin is closed; stdout and stderr are drained concurrently and each is
/// captured up to `max_output_bytes`. With `kill_on_cancel` set, cancelling
/// the run's context kills the child and reports the run as `Cancelled`;
/// otherwise the child always runs to completion.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
    max_output_bytes: usize,
    kill_on_cancel: bool,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl ShellExecutor {
    /// Executor using `shell`.
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            kill_on_cancel: false,
        }
    }

    /// Capture at most `max` bytes of each output stream.
    #[must_use]
    pub const fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    /// Kill the child when the run's context is cancelled.
    #[must_use]
    pub const fn with_kill_on_cancel(mut self, kill: bool) -> Self {
        self.kill_on_cancel = kill;
        self
    }

    /// The shell program.
    #[must_use]
    pub fn shell(&self) -> &str {
        &self.shell
    }
}

#[async_trait]
impl JobExecutor for ShellExecutor {
    async fn exec_and_wait(&self, cmd: &str, ctx: &Context) -> Result<ExecOutput> {
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| JobberError::Exec(format!("failed to start {}: {e}", self.shell)))?;
        debug!(pid = ?child.id(), context = %ctx.name(), "spawned job process");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| JobberError::Exec("stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| JobberError::Exec("stderr was not captured".into()))?;
        let limit = self.max_output_bytes;
        let stdout_task = tokio::spawn(read_bounded(stdout, limit));
        let stderr_task = tokio::spawn(read_bounded(stderr, limit));

        let status = if self.kill_on_cancel {
            tokio::select! {
                status = child.wait() => Some(status?),
                () = ctx.cancelled() => None,
            }
        } else {
            Some(child.wait().await?)
        };

        let Some(status) = status else {
            warn!(context = %ctx.name(), "run cancelled; killing job process");
            if let Err(err) = child.kill().await {
                warn!(error = %err, "failed to kill job process");
            }
            stdout_task.abort();
            stderr_task.abort();
            return Ok(ExecOutput {
                stdout: Vec::new(),
                stderr: Vec::new(),
                fate: RunFate::Cancelled,
            });
        };

        let join = |e: tokio::task::JoinError| JobberError::Exec(format!("output reader failed: {e}"));
        let stdout = stdout_task.await.map_err(join)??;
        let stderr = stderr_task.await.map_err(join)??;
        let fate = if status.success() {
            RunFate::Succeeded
        } else {
            RunFate::Failed
        };
        debug!(%status, %fate, "job process exited");
        Ok(ExecOutput {
            stdout,
            stderr,
            fate,
        })
    }
}

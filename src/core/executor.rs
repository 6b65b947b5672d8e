//! Process execution seam.

use async_trait::async_trait;

use crate::core::{Context, Result, RunFate};

/// What a finished command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Captured standard output (bounded by the executor).
    pub stdout: Vec<u8>,
    /// Captured standard error (bounded by the executor).
    pub stderr: Vec<u8>,
    /// How the command ended.
    pub fate: RunFate,
}

impl ExecOutput {
    /// Output of a command that exited with status 0.
    #[must_use]
    pub fn succeeded(stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            fate: RunFate::Succeeded,
        }
    }

    /// Output of a command that exited non-zero.
    #[must_use]
    pub fn failed(stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            fate: RunFate::Failed,
        }
    }
}

/// Runs a job's command to completion.
///
/// The executor owns everything about the subprocess: how it is launched,
/// how output is captured and whether it honours cancellation of `ctx`. An
/// `Err` means the command could not be run at all; the runner reports it as
/// a failed run with the error text in place of stdout.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use jobber::core::{Context, ExecOutput, JobExecutor, Result};
///
/// struct Echo;
///
/// #[async_trait]
/// impl JobExecutor for Echo {
///     async fn exec_and_wait(&self, cmd: &str, _ctx: &Context) -> Result<ExecOutput> {
///         Ok(ExecOutput::succeeded(cmd.as_bytes(), Vec::new()))
///     }
/// }
/// ```
#[async_trait]
pub trait JobExecutor: Send + Sync + 'static {
    /// Run `cmd` and wait for it to finish.
    async fn exec_and_wait(&self, cmd: &str, ctx: &Context) -> Result<ExecOutput>;
}

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use jobber::core::{Context, ExecOutput, JobExecutor, JobberError, Result, RunFate};

/// Executor whose behaviour is chosen by the command text:
///
/// - `true` succeeds with stdout `ok`
/// - `false` fails with stderr `boom`
/// - `gate` blocks until [`ScriptedExecutor::release`], ignoring cancellation
/// - `sleep` blocks until its context is cancelled
/// - `error` cannot be started
pub struct ScriptedExecutor {
    started: Mutex<Vec<String>>,
    finished: Mutex<Vec<(String, RunFate)>>,
    gate: Semaphore,
}

impl ScriptedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
            gate: Semaphore::new(0),
        })
    }

    /// Let `n` blocked `gate` runs complete.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    pub fn finished(&self) -> Vec<(String, RunFate)> {
        self.finished.lock().clone()
    }
}

#[async_trait]
impl JobExecutor for ScriptedExecutor {
    async fn exec_and_wait(&self, cmd: &str, ctx: &Context) -> Result<ExecOutput> {
        self.started.lock().push(cmd.to_owned());
        let out = match cmd {
            "true" => ExecOutput::succeeded("ok", ""),
            "false" => ExecOutput::failed("", "boom"),
            "gate" => {
                if let Ok(permit) = self.gate.acquire().await {
                    permit.forget();
                }
                ExecOutput::succeeded("released", "")
            }
            "sleep" => {
                ctx.cancelled().await;
                ExecOutput {
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                    fate: RunFate::Cancelled,
                }
            }
            "error" => return Err(JobberError::Exec("spawn failed".into())),
            other => ExecOutput::failed(format!("unknown command {other}"), ""),
        };
        self.finished.lock().push((cmd.to_owned(), out.fate));
        Ok(out)
    }
}

/// Poll `cond` every 20ms until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}

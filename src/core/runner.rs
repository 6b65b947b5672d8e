//! Job runner: the dispatch loop.
//!
//! A runner owns a [`JobQueue`] and a child [`Context`] of the manager's main
//! context. Its dispatch task pops due jobs and spawns one execution task per
//! run, each in its own grandchild context. Every run produces exactly one
//! [`RunRec`] on the results channel; the channel closes only after every
//! started run has delivered its record.
//!
//! A job is never started again while an earlier run of it is in flight.
//! Occurrences that come due meanwhile are consumed and skipped.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::{Context, ContextCtl, ExecOutput, Job, JobExecutor, JobQueue, Result, RunFate, RunRec};
use crate::util::clock;

/// Handle to a running dispatch loop.
pub struct JobRunner {
    ctl: ContextCtl,
    results: mpsc::Receiver<RunRec>,
}

impl JobRunner {
    /// Schedule `jobs` from now and start dispatching them under a child of
    /// `parent`.
    ///
    /// Fails with [`crate::core::JobberError::ContextClosed`] if `parent` is
    /// already cancelled or finishing.
    pub fn start(jobs: &[Job], executor: Arc<dyn JobExecutor>, parent: &Context) -> Result<Self> {
        let (ctx, ctl) = parent.make_child()?;
        let (tx, results) = mpsc::channel(1);

        let mut queue = JobQueue::new();
        queue.set_jobs(clock::now(), jobs);
        info!(context = %ctx.name(), scheduled = queue.len(), "job runner starting");

        tokio::spawn(dispatch(queue, executor, ctx, tx));
        Ok(Self { ctl, results })
    }

    /// Stop dispatching new runs. Runs already in flight continue and still
    /// deliver their records.
    pub fn cancel(&self) {
        self.ctl.cancel();
    }

    /// Wait until the dispatch loop and every run it started have finished.
    pub async fn wait(&self) {
        self.ctl.wait_for_finish().await;
    }

    /// Next run record, or `None` once the runner has shut down and every
    /// record has been received.
    pub async fn next_rec(&mut self) -> Option<RunRec> {
        self.results.recv().await
    }

    /// Supervisor handle to the runner's context.
    #[must_use]
    pub fn ctl(&self) -> &ContextCtl {
        &self.ctl
    }
}

async fn dispatch(
    mut queue: JobQueue,
    executor: Arc<dyn JobExecutor>,
    ctx: Context,
    tx: mpsc::Sender<RunRec>,
) {
    let in_flight: Arc<Mutex<HashSet<String>>> = Arc::default();
    while let Some(job) = queue.pop(&ctx, clock::now()).await {
        if job.is_paused() {
            debug!(job = %job, "job is paused; not running");
            continue;
        }
        if !in_flight.lock().insert(job.name().to_owned()) {
            debug!(job = %job, "previous run still in flight; skipping occurrence");
            continue;
        }
        let Ok((run_ctx, _)) = ctx.make_child() else {
            in_flight.lock().remove(job.name());
            break;
        };

        let executor = Arc::clone(&executor);
        let tx = tx.clone();
        let in_flight = Arc::clone(&in_flight);
        tokio::spawn(async move {
            let rec = run_job(&job, executor.as_ref(), &run_ctx).await;
            if tx.send(rec).await.is_err() {
                warn!(job = %job, "results channel closed; run record dropped");
            }
            in_flight.lock().remove(job.name());
            run_ctx.finish().await;
        });
    }

    debug!(context = %ctx.name(), "dispatch loop stopped; waiting for runs");
    ctx.wait_for_children().await;
    drop(tx);
    ctx.finish().await;
    info!("job runner stopped");
}

/// Run `job` once with `executor` and record the outcome.
///
/// An executor error becomes a `Failed` run whose stdout is the error text.
pub async fn run_job(job: &Job, executor: &dyn JobExecutor, ctx: &Context) -> RunRec {
    let start = clock::now();
    let started = tokio::time::Instant::now();
    info!(job = %job, context = %ctx.name(), "running job");

    let output = match executor.exec_and_wait(job.cmd(), ctx).await {
        Ok(output) => output,
        Err(err) => {
            warn!(job = %job, error = %err, "could not run job");
            ExecOutput {
                stdout: err.to_string().into_bytes(),
                stderr: Vec::new(),
                fate: RunFate::Failed,
            }
        }
    };

    let elapsed = started.elapsed();
    debug!(job = %job, fate = %output.fate, ?elapsed, "job run finished");
    RunRec::new(
        job.clone(),
        start,
        elapsed,
        output.stdout,
        output.stderr,
        output.fate,
    )
}

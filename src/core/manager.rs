//! Job manager: the single owner of job state.
//!
//! The manager loop owns the job set, the current [`JobRunner`] and the main
//! [`Context`]. It applies every [`RunRec`] to its job, records it in the run
//! log, notifies result sinks and serves administrative [`Command`]s, all
//! from one task, so job outcomes are never applied concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::runner::run_job;
use crate::core::{
    Command, Context, Job, JobDef, JobDesc, JobExecutor, JobLoader, JobRunner, JobStatus, JobberError,
    LogDesc, Result, RunFate, RunLog, RunLogEntry, RunRec,
};
use crate::runtime::api::ManagerHandle;

/// Capacity of the command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Scheduler state and collaborators, before launch.
pub struct JobManager {
    loader: Arc<dyn JobLoader>,
    executor: Arc<dyn JobExecutor>,
    run_log: Box<dyn RunLog>,
    test_timeout: Option<Duration>,
    name: String,
}

impl JobManager {
    /// A manager that loads jobs with `loader`, runs them with `executor`
    /// and records runs in `run_log`.
    pub fn new(
        loader: Arc<dyn JobLoader>,
        executor: Arc<dyn JobExecutor>,
        run_log: Box<dyn RunLog>,
    ) -> Self {
        Self {
            loader,
            executor,
            run_log,
            test_timeout: None,
            name: "main".into(),
        }
    }

    /// Cancel `Test` runs that take longer than `timeout`.
    #[must_use]
    pub const fn with_test_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Name of the main context, used in logs.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Start the manager loop on the current tokio runtime.
    ///
    /// The loop loads the job set (an initial load error is logged and the
    /// manager starts with no jobs) and starts the first runner.
    #[must_use]
    pub fn launch(self) -> ManagerHandle {
        let (ctx, ctl) = Context::root(self.name.clone());
        let (tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let state = ManagerLoop {
            loader: self.loader,
            executor: self.executor,
            run_log: self.run_log,
            test_timeout: self.test_timeout,
            jobs: BTreeMap::new(),
            runner: None,
            ctx,
            commands,
        };
        tokio::spawn(state.run());
        ManagerHandle::new(tx, ctl)
    }
}

struct ManagerLoop {
    loader: Arc<dyn JobLoader>,
    executor: Arc<dyn JobExecutor>,
    run_log: Box<dyn RunLog>,
    test_timeout: Option<Duration>,
    jobs: BTreeMap<String, Job>,
    runner: Option<JobRunner>,
    ctx: Context,
    commands: mpsc::Receiver<Command>,
}

async fn next_rec(runner: &mut Option<JobRunner>) -> Option<RunRec> {
    match runner {
        Some(runner) => runner.next_rec().await,
        None => std::future::pending().await,
    }
}

impl ManagerLoop {
    async fn run(mut self) {
        info!(context = %self.ctx.name(), "job manager starting");
        match self.loader.load() {
            Ok(jobs) => self.set_jobs(jobs),
            Err(err) => error!(error = %err, "failed to load jobs; starting with none"),
        }
        self.start_runner();

        loop {
            tokio::select! {
                () = self.ctx.cancelled() => {
                    info!("job manager cancelled");
                    break;
                }
                rec = next_rec(&mut self.runner) => match rec {
                    Some(rec) => self.handle_run_rec(rec).await,
                    None => {
                        warn!("job runner ended unexpectedly");
                        self.runner = None;
                    }
                },
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        info!("command channel closed; stopping");
                        self.ctx.cancel();
                        break;
                    }
                },
            }
        }

        self.commands.close();
        self.stop_runner().await;
        self.ctx.finish().await;
        info!("job manager stopped");
    }

    fn set_jobs(&mut self, jobs: Vec<Job>) {
        self.jobs = jobs
            .into_iter()
            .map(|job| (job.name().to_owned(), job))
            .collect();
    }

    fn start_runner(&mut self) {
        let jobs: Vec<Job> = self.jobs.values().cloned().collect();
        match JobRunner::start(&jobs, Arc::clone(&self.executor), &self.ctx) {
            Ok(runner) => self.runner = Some(runner),
            Err(err) => warn!(error = %err, "could not start job runner"),
        }
    }

    /// Cancel the runner, apply every record it still delivers, and wait for
    /// it to finish.
    async fn stop_runner(&mut self) {
        let Some(mut runner) = self.runner.take() else {
            return;
        };
        debug!("stopping job runner");
        runner.cancel();
        while let Some(rec) = runner.next_rec().await {
            self.handle_run_rec(rec).await;
        }
        runner.wait().await;
    }

    async fn handle_run_rec(&mut self, rec: RunRec) {
        let status = rec.job.apply_run(rec.fate, rec.start);
        let rec = rec.with_new_status(status);
        info!(
            job = %rec.job,
            run_id = %rec.run_id,
            fate = %rec.fate,
            status = %status,
            "job run completed"
        );
        self.run_log.put(RunLogEntry::from(&rec));

        let notify = &rec.job.def().notify;
        if rec.fate == RunFate::Failed {
            for sink in &notify.on_error {
                sink.handle(&rec).await;
            }
        }
        if status == JobStatus::Failed {
            for sink in &notify.on_failure {
                sink.handle(&rec).await;
            }
        }
        if rec.fate == RunFate::Succeeded {
            for sink in &notify.on_success {
                sink.handle(&rec).await;
            }
        }
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Reload { reply } => {
                let result = self.reload().await;
                let _ = reply.send(result);
            }
            Command::ListJobs { reply } => {
                let _ = reply.send(self.jobs.values().map(JobDesc::from).collect());
            }
            Command::Log { job, reply } => {
                let _ = reply.send(self.log(job.as_deref()));
            }
            Command::Test { job, reply } => {
                let result = self.test(&job).await;
                let _ = reply.send(result);
            }
            Command::Cat { job, reply } => {
                let result = self.find_jobs(std::slice::from_ref(&job)).map(|jobs| {
                    jobs.first().map(|j| j.cmd().to_owned()).unwrap_or_default()
                });
                let _ = reply.send(result);
            }
            Command::Pause { jobs, reply } => {
                let _ = reply.send(self.set_paused(&jobs, true));
            }
            Command::Resume { jobs, reply } => {
                let _ = reply.send(self.set_paused(&jobs, false));
            }
            Command::SetJob { job, reply } => {
                let result = self.set_job(job).await;
                let _ = reply.send(result);
            }
            Command::DeleteJob { job, reply } => {
                let result = self.delete_job(&job).await;
                let _ = reply.send(result);
            }
        }
    }

    async fn reload(&mut self) -> Result<usize> {
        // Parse first so a bad job file leaves everything running as before.
        let jobs = self.loader.load().inspect_err(|err| {
            warn!(error = %err, "reload failed; keeping current jobs");
        })?;
        self.replace_jobs(jobs).await;
        info!(jobs = self.jobs.len(), "jobs reloaded");
        Ok(self.jobs.len())
    }

    /// Stop the runner (applying every record it still delivers), install
    /// `jobs` and start a new runner.
    async fn replace_jobs(&mut self, jobs: Vec<Job>) {
        self.stop_runner().await;
        self.set_jobs(jobs);
        self.start_runner();
    }

    async fn set_job(&mut self, def: JobDef) -> Result<bool> {
        if def.name.is_empty() {
            return Err(JobberError::InvalidJobFile("job name must not be empty".into()));
        }
        let job = Job::new(def);
        let mut jobs: Vec<Job> = self
            .jobs
            .values()
            .filter(|j| j.name() != job.name())
            .cloned()
            .collect();
        let replaced = jobs.len() < self.jobs.len();
        jobs.push(job.clone());
        self.replace_jobs(jobs).await;
        info!(job = %job, replaced, "job set");
        Ok(replaced)
    }

    async fn delete_job(&mut self, name: &str) -> Result<()> {
        if !self.jobs.contains_key(name) {
            return Err(JobberError::NoSuchJobs(vec![name.to_owned()]));
        }
        let jobs: Vec<Job> = self
            .jobs
            .values()
            .filter(|j| j.name() != name)
            .cloned()
            .collect();
        self.replace_jobs(jobs).await;
        info!(job = name, "job deleted");
        Ok(())
    }

    fn find_jobs(&self, names: &[String]) -> Result<Vec<Job>> {
        if names.is_empty() {
            return Ok(self.jobs.values().cloned().collect());
        }
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !self.jobs.contains_key(n.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(JobberError::NoSuchJobs(missing));
        }
        Ok(names.iter().filter_map(|n| self.jobs.get(n).cloned()).collect())
    }

    fn set_paused(&self, names: &[String], paused: bool) -> Result<usize> {
        let jobs = self.find_jobs(names)?;
        let changed = jobs.iter().filter(|j| j.set_paused(paused)).count();
        info!(changed, paused, "pause state updated");
        Ok(changed)
    }

    fn log(&self, job: Option<&str>) -> Result<Vec<LogDesc>> {
        if let Some(name) = job {
            if !self.jobs.contains_key(name) {
                return Err(JobberError::NoSuchJobs(vec![name.to_owned()]));
            }
        }
        Ok(self
            .run_log
            .get_all()
            .into_iter()
            .filter(|e| job.is_none_or(|name| e.job_name == name))
            .map(LogDesc::from)
            .collect())
    }

    async fn test(&self, name: &str) -> Result<RunRec> {
        let job = self
            .jobs
            .get(name)
            .cloned()
            .ok_or_else(|| JobberError::NoSuchJobs(vec![name.to_owned()]))?;
        let (ctx, _ctl) = match self.test_timeout {
            Some(timeout) => self.ctx.make_child_with_timeout(timeout)?,
            None => self.ctx.make_child()?,
        };
        let rec = run_job(&job, self.executor.as_ref(), &ctx).await;
        ctx.finish().await;
        Ok(rec)
    }
}

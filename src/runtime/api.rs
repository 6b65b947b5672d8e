//! Client-facing API for a running job manager.

use std::fmt::Write as _;

use tokio::sync::{mpsc, oneshot};

use crate::core::{Command, ContextCtl, JobDef, JobDesc, JobberError, LogDesc, Result, RunRec};

/// Cloneable, transport-agnostic handle to a launched
/// [`JobManager`](crate::core::JobManager).
///
/// Every request fails with [`JobberError::ManagerStopped`] once the manager
/// loop has exited.
#[derive(Clone, Debug)]
pub struct ManagerHandle {
    commands: mpsc::Sender<Command>,
    ctl: ContextCtl,
}

impl ManagerHandle {
    pub(crate) const fn new(commands: mpsc::Sender<Command>, ctl: ContextCtl) -> Self {
        Self { commands, ctl }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| JobberError::ManagerStopped)?;
        rx.await.map_err(|_| JobberError::ManagerStopped)
    }

    /// Reload the job set; returns the new number of jobs.
    pub async fn reload(&self) -> Result<usize> {
        self.request(|reply| Command::Reload { reply }).await?
    }

    /// Describe every job.
    pub async fn list_jobs(&self) -> Result<Vec<JobDesc>> {
        self.request(|reply| Command::ListJobs { reply }).await
    }

    /// Recent runs, newest first, optionally for one job.
    pub async fn log(&self, job: Option<String>) -> Result<Vec<LogDesc>> {
        self.request(|reply| Command::Log { job, reply }).await?
    }

    /// Run a job now and return its record; job state is not changed.
    pub async fn test(&self, job: impl Into<String>) -> Result<RunRec> {
        let job = job.into();
        self.request(|reply| Command::Test { job, reply }).await?
    }

    /// A job's command text.
    pub async fn cat(&self, job: impl Into<String>) -> Result<String> {
        let job = job.into();
        self.request(|reply| Command::Cat { job, reply }).await?
    }

    /// Pause jobs (all if `jobs` is empty); returns how many changed.
    pub async fn pause(&self, jobs: Vec<String>) -> Result<usize> {
        self.request(|reply| Command::Pause { jobs, reply }).await?
    }

    /// Resume jobs (all if `jobs` is empty); returns how many changed.
    pub async fn resume(&self, jobs: Vec<String>) -> Result<usize> {
        self.request(|reply| Command::Resume { jobs, reply }).await?
    }

    /// Add `job`, or replace the job of the same name; returns whether one
    /// was replaced. Not written back to the job file, so a later reload
    /// discards it.
    pub async fn set_job(&self, job: JobDef) -> Result<bool> {
        self.request(|reply| Command::SetJob { job, reply }).await?
    }

    /// Remove a job until the next reload.
    pub async fn delete_job(&self, job: impl Into<String>) -> Result<()> {
        let job = job.into();
        self.request(|reply| Command::DeleteJob { job, reply }).await?
    }

    /// Ask the manager to stop. Returns immediately; use [`Self::wait`] to
    /// join.
    pub fn stop(&self) {
        self.ctl.cancel();
    }

    /// Wait until the manager and every run it started have finished.
    pub async fn wait(&self) {
        self.ctl.wait_for_finish().await;
    }

    /// Whether the manager has finished.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.ctl.is_finished()
    }
}

/// Render a job listing as an aligned text table.
#[must_use]
pub fn format_job_table(jobs: &[JobDesc]) -> String {
    let rows: Vec<[String; 5]> = jobs
        .iter()
        .map(|j| {
            [
                j.name.clone(),
                j.status.clone(),
                j.schedule.clone(),
                j.next_run_time
                    .map_or_else(|| "none".into(), |t| t.format("%b %-d %H:%M:%S").to_string()),
                j.error_handler.to_string(),
            ]
        })
        .collect();
    let header = ["NAME", "STATUS", "SCHEDULE", "NEXT RUN TIME", "ON ERROR"].map(String::from);

    let mut widths = header.clone().map(|h| h.len());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(&rows) {
        let mut line = String::new();
        for (cell, w) in row.iter().zip(widths) {
            let _ = write!(line, "{cell:<w$}  ");
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorHandler;

    #[test]
    fn test_format_job_table() {
        let jobs = vec![JobDesc {
            name: "Backup".into(),
            status: "Good".into(),
            schedule: "0 0 14 * * *".into(),
            next_run_time: None,
            last_run_time: None,
            error_handler: ErrorHandler::Backoff,
            notify_on_error: vec![],
            notify_on_failure: vec![],
            notify_on_success: vec![],
        }];
        let table = format_job_table(&jobs);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("NAME    STATUS"));
        assert!(lines[1].starts_with("Backup  Good"));
        assert!(lines[1].ends_with("Backoff"));
    }
}

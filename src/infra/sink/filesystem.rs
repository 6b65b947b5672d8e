//! Result sink that writes run output to files.
//!
//! For a job named `Backup` and a sink rooted at `/var/jobber`, each run
//! produces `/var/jobber/Backup/<unix-start>.stdout` and `.stderr`. Files
//! older than `max_age_days` are deleted after each write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::SinkData;
use crate::core::{JobberError, Result, ResultSink, RunRec};
use crate::util::clock::{self, unix_secs};

const STDOUT_SUFFIX: &str = "stdout";
const STDERR_SUFFIX: &str = "stderr";
const SECS_PER_DAY: i64 = 86_400;

/// Writes each run's output under `<path>/<job>/`.
#[derive(Debug, Clone)]
pub struct FilesystemResultSink {
    path: PathBuf,
    data: SinkData,
    max_age_days: u32,
}

impl FilesystemResultSink {
    /// Validate parameters and build the sink.
    pub fn new(path: impl Into<PathBuf>, data: SinkData, max_age_days: u32) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(JobberError::InvalidJobFile(
                "filesystem result sink needs 'path' param".into(),
            ));
        }
        if max_age_days < 1 {
            return Err(JobberError::InvalidJobFile(
                "filesystem result sink's 'maxAgeDays' param must be >= 1".into(),
            ));
        }
        Ok(Self {
            path,
            data,
            max_age_days,
        })
    }

    async fn write(&self, rec: &RunRec) -> std::io::Result<PathBuf> {
        let dir = self.path.join(rec.job.name());
        tokio::fs::create_dir_all(&dir).await?;
        let stamp = unix_secs(&rec.start);
        if self.data.stdout {
            tokio::fs::write(dir.join(format!("{stamp}.{STDOUT_SUFFIX}")), &rec.stdout).await?;
        }
        if self.data.stderr {
            tokio::fs::write(dir.join(format!("{stamp}.{STDERR_SUFFIX}")), &rec.stderr).await?;
        }
        Ok(dir)
    }

    async fn delete_old_outputs(&self, dir: &Path) -> std::io::Result<usize> {
        let now = unix_secs(&clock::now());
        let max_age_days = i64::from(self.max_age_days);
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(stamp) = name.to_str().and_then(run_time_of) else {
                debug!(file = ?name, "ignoring unrecognised file");
                continue;
            };
            if (now - stamp) / SECS_PER_DAY > max_age_days {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Start time encoded in an output file name like `1521318351.stdout`.
fn run_time_of(name: &str) -> Option<i64> {
    let (secs, suffix) = name.split_once('.')?;
    if suffix != STDOUT_SUFFIX && suffix != STDERR_SUFFIX {
        return None;
    }
    secs.parse().ok()
}

#[async_trait]
impl ResultSink for FilesystemResultSink {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn handle(&self, rec: &RunRec) {
        let dir = match self.write(rec).await {
            Ok(dir) => dir,
            Err(err) => {
                warn!(job = %rec.job, path = %self.path.display(), error = %err, "failed to write run output");
                return;
            }
        };
        match self.delete_old_outputs(&dir).await {
            Ok(0) => {}
            Ok(removed) => debug!(job = %rec.job, removed, "deleted old run output"),
            Err(err) => warn!(job = %rec.job, error = %err, "failed to clean up run output"),
        }
    }
}

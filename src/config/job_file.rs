//! YAML job file loading.
//!
//! ```yaml
//! version: 1.4
//! resultSinks:
//!   - &prog {type: program, path: /usr/local/bin/notify}
//! jobs:
//!   Backup:
//!     cmd: backup daily
//!     time: 0 0 14
//!     onError: Backoff
//!     notifyOnError: [*prog]
//!     notifyOnFailure: [*prog]
//! ```
//!
//! `resultSinks` exists only so jobs can share sink definitions through YAML
//! anchors. Unknown fields are rejected everywhere.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::core::{
    ErrorHandler, FullTimeSpec, Job, JobDef, JobLoader, JobberError, NotifySinks, Result,
    ResultSink,
};
use crate::infra::sink::{
    FilesystemResultSink, ProgramResultSink, SinkData, StdoutResultSink,
};

/// A result sink as written in the job file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum SinkConfig {
    /// Print run records to the daemon's stdout.
    Stdout {
        /// Streams to include.
        #[serde(default)]
        data: SinkData,
    },
    /// Pipe run records to a program.
    Program {
        /// Program to run.
        path: PathBuf,
    },
    /// Write run output to files.
    Filesystem {
        /// Root directory.
        path: PathBuf,
        /// Streams to write.
        #[serde(default)]
        data: SinkData,
        /// Delete outputs older than this many days.
        #[serde(rename = "maxAgeDays")]
        max_age_days: u32,
    },
}

impl SinkConfig {
    /// Build the sink this entry describes.
    pub fn build(&self) -> Result<Arc<dyn ResultSink>> {
        Ok(match self {
            Self::Stdout { data } => Arc::new(StdoutResultSink::new(*data)),
            Self::Program { path } => {
                if path.as_os_str().is_empty() {
                    return Err(JobberError::InvalidJobFile(
                        "program result sink needs 'path' param".into(),
                    ));
                }
                Arc::new(ProgramResultSink::new(path.clone()))
            }
            Self::Filesystem {
                path,
                data,
                max_age_days,
            } => Arc::new(FilesystemResultSink::new(path.clone(), *data, *max_age_days)?),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawJobFile {
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    #[allow(dead_code)]
    result_sinks: Vec<SinkConfig>,
    #[serde(default)]
    jobs: BTreeMap<String, RawJob>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawJob {
    cmd: String,
    #[serde(default)]
    time: Option<Value>,
    #[serde(default)]
    on_error: Option<String>,
    #[serde(default)]
    notify_on_error: Vec<SinkConfig>,
    #[serde(default)]
    notify_on_failure: Vec<SinkConfig>,
    #[serde(default)]
    notify_on_success: Vec<SinkConfig>,
}

fn scalar_text(name: &str, value: Option<&Value>) -> Result<String> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(JobberError::InvalidJobFile(format!(
            "job '{name}': 'time' must be a string, got {other:?}"
        ))),
    }
}

/// Builds sinks, reusing one instance per distinct configuration.
#[derive(Default)]
struct SinkCache {
    built: Vec<(SinkConfig, Arc<dyn ResultSink>)>,
}

impl SinkCache {
    fn get(&mut self, configs: &[SinkConfig]) -> Result<Vec<Arc<dyn ResultSink>>> {
        configs
            .iter()
            .map(|cfg| {
                if let Some((_, sink)) = self.built.iter().find(|(c, _)| c == cfg) {
                    return Ok(Arc::clone(sink));
                }
                let sink = cfg.build()?;
                self.built.push((cfg.clone(), Arc::clone(&sink)));
                Ok(sink)
            })
            .collect()
    }
}

/// Parse job file text into jobs owned by `user`, sorted by name.
pub fn parse_job_file(text: &str, user: &str) -> Result<Vec<Job>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: RawJobFile = serde_yaml::from_str(text)?;
    if let Some(version) = &raw.version {
        debug!(?version, "job file version");
    }

    let mut sinks = SinkCache::default();
    let mut jobs = Vec::with_capacity(raw.jobs.len());
    for (name, job) in raw.jobs {
        if name.trim().is_empty() {
            return Err(JobberError::InvalidJobFile("job name must not be empty".into()));
        }
        let time = FullTimeSpec::parse(&scalar_text(&name, job.time.as_ref())?)?;
        let error_handler = match &job.on_error {
            Some(h) => h.parse::<ErrorHandler>()?,
            None => ErrorHandler::default(),
        };
        let notify = NotifySinks {
            on_error: sinks.get(&job.notify_on_error)?,
            on_failure: sinks.get(&job.notify_on_failure)?,
            on_success: sinks.get(&job.notify_on_success)?,
        };
        let def = JobDef::new(name, user, job.cmd, time)
            .with_error_handler(error_handler)
            .with_notify(notify);
        jobs.push(Job::new(def));
    }
    Ok(jobs)
}

/// Loads jobs from a YAML job file on every call.
#[derive(Debug, Clone)]
pub struct YamlJobFileLoader {
    path: PathBuf,
    user: String,
}

impl YamlJobFileLoader {
    /// Loader for the file at `path`, owned by `user`.
    pub fn new(path: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            user: user.into(),
        }
    }

    /// Path of the job file.
    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl JobLoader for YamlJobFileLoader {
    fn load(&self) -> Result<Vec<Job>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no job file; no jobs loaded");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };
        let jobs = parse_job_file(&text, &self.user)?;
        info!(path = %self.path.display(), jobs = jobs.len(), "loaded job file");
        Ok(jobs)
    }
}

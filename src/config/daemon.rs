//! Daemon configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::runtime::DEFAULT_SHELL;
use crate::util::DEFAULT_MAX_OUTPUT_BYTES;

/// Default run-log capacity.
pub const DEFAULT_RUN_LOG_MAX_LEN: usize = 10_000;

const ENV_PREFIX: &str = "JOBBER_";

/// Settings for one user's scheduler daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// YAML job file to load.
    pub job_file: PathBuf,
    /// User the jobs belong to.
    pub user: String,
    /// Shell used to run job commands.
    pub shell: String,
    /// Maximum run-log entries kept in memory.
    pub run_log_max_len: usize,
    /// Per-stream cap on captured output.
    pub max_output_bytes: usize,
    /// Kill a job's process when its run is cancelled.
    pub kill_on_cancel: bool,
    /// Timeout for on-demand test runs; 0 disables it.
    pub test_timeout_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let user = std::env::var("USER").unwrap_or_default();
        let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
        Self {
            job_file: home.join(".jobber"),
            user,
            shell: DEFAULT_SHELL.to_string(),
            run_log_max_len: DEFAULT_RUN_LOG_MAX_LEN,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            kill_on_cancel: false,
            test_timeout_secs: 0,
        }
    }
}

impl DaemonConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.job_file.as_os_str().is_empty() {
            return Err("job_file must not be empty".into());
        }
        if self.user.trim().is_empty() {
            return Err("user must not be empty".into());
        }
        if self.shell.trim().is_empty() {
            return Err("shell must not be empty".into());
        }
        if self.run_log_max_len == 0 {
            return Err("run_log_max_len must be greater than 0".into());
        }
        if self.max_output_bytes == 0 {
            return Err("max_output_bytes must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `JOBBER_*` environment variables, after
    /// loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars())
    }

    /// Defaults overridden by `JOBBER_*` entries in `vars`.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut cfg = Self::default();
        for (key, value) in vars {
            let Some(key) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value: String = value.into();
            match key {
                "JOB_FILE" => cfg.job_file = PathBuf::from(value),
                "USER" => cfg.user = value,
                "SHELL" => cfg.shell = value,
                "RUN_LOG_MAX_LEN" => cfg.run_log_max_len = parse_var(key, &value)?,
                "MAX_OUTPUT_BYTES" => cfg.max_output_bytes = parse_var(key, &value)?,
                "KILL_ON_CANCEL" => cfg.kill_on_cancel = parse_var(key, &value)?,
                "TEST_TIMEOUT_SECS" => cfg.test_timeout_secs = parse_var(key, &value)?,
                _ => {}
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{ENV_PREFIX}{key}: invalid value '{value}': {e}"))
}

//! Wire a [`JobManager`] from a [`DaemonConfig`].

use std::sync::Arc;
use std::time::Duration;

use crate::config::{DaemonConfig, YamlJobFileLoader};
use crate::core::{JobManager, JobberError, Result};
use crate::infra::InMemoryRunLog;
use crate::runtime::ShellExecutor;

/// Build a manager that loads `cfg.job_file`, runs commands with
/// `cfg.shell` and keeps an in-memory run log.
pub fn build_manager(cfg: &DaemonConfig) -> Result<JobManager> {
    cfg.validate()
        .map_err(|e| JobberError::InvalidConfig(format!("config invalid: {e}")))?;

    let loader = YamlJobFileLoader::new(cfg.job_file.clone(), cfg.user.clone());
    let executor = ShellExecutor::new(cfg.shell.clone())
        .with_max_output_bytes(cfg.max_output_bytes)
        .with_kill_on_cancel(cfg.kill_on_cancel);
    let run_log = InMemoryRunLog::new(cfg.run_log_max_len);
    let test_timeout =
        (cfg.test_timeout_secs > 0).then(|| Duration::from_secs(cfg.test_timeout_secs));

    Ok(JobManager::new(Arc::new(loader), Arc::new(executor), Box::new(run_log))
        .with_test_timeout(test_timeout)
        .with_name(format!("main:{}", cfg.user)))
}

//! Per-user job scheduler daemon.
//!
//! Reads settings from `JOBBER_*` environment variables (and `.env`), with
//! command-line flags taking precedence. `SIGHUP` reloads the job file;
//! `SIGINT` and `SIGTERM` stop the daemon after in-flight runs finish.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use jobber::builders::build_manager;
use jobber::config::{DaemonConfig, YamlJobFileLoader};
use jobber::core::{JobDesc, JobLoader, JobQueue};
use jobber::runtime::{format_job_table, ManagerHandle};
use jobber::util::{clock, init_tracing_with};

#[derive(Parser, Debug)]
#[command(name = "jobberd")]
#[command(about = "Run scheduled jobs from a YAML job file")]
struct Cli {
    /// Job file to load
    #[arg(long)]
    job_file: Option<PathBuf>,

    /// User the jobs belong to
    #[arg(long)]
    user: Option<String>,

    /// Shell used to run job commands
    #[arg(long)]
    shell: Option<String>,

    /// Kill a job's process when its run is cancelled
    #[arg(long)]
    kill_on_cancel: bool,

    /// Timeout in seconds for test runs (0 disables it)
    #[arg(long)]
    test_timeout_secs: Option<u64>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Parse the job file, print its jobs and exit
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn apply(self, mut cfg: DaemonConfig) -> Result<DaemonConfig> {
        if let Some(path) = self.job_file {
            cfg.job_file = path;
        }
        if let Some(user) = self.user {
            cfg.user = user;
        }
        if let Some(shell) = self.shell {
            cfg.shell = shell;
        }
        if self.kill_on_cancel {
            cfg.kill_on_cancel = true;
        }
        if let Some(secs) = self.test_timeout_secs {
            cfg.test_timeout_secs = secs;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

fn check(cfg: &DaemonConfig) -> Result<()> {
    let jobs = YamlJobFileLoader::new(cfg.job_file.clone(), cfg.user.clone())
        .load()
        .with_context(|| format!("loading {}", cfg.job_file.display()))?;
    let mut queue = JobQueue::new();
    queue.set_jobs(clock::now(), &jobs);
    let descs: Vec<JobDesc> = jobs.iter().map(JobDesc::from).collect();
    print!("{}", format_job_table(&descs));
    Ok(())
}

async fn serve(handle: ManagerHandle) -> Result<()> {
    let mut hangup = signal(SignalKind::hangup()).context("installing SIGHUP handler")?;
    let mut interrupt = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;

    loop {
        tokio::select! {
            _ = hangup.recv() => match handle.reload().await {
                Ok(jobs) => info!(jobs, "reloaded job file"),
                Err(err) => error!(error = %err, "reload failed"),
            },
            _ = interrupt.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
            _ = terminate.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            () = handle.wait() => {
                info!("manager stopped");
                return Ok(());
            }
        }
    }

    handle.stop();
    handle.wait().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_with(&cli.log_level);

    let check_only = cli.check;
    let cfg = cli.apply(DaemonConfig::from_env().map_err(anyhow::Error::msg)?)?;
    if check_only {
        return check(&cfg);
    }

    info!(user = %cfg.user, job_file = %cfg.job_file.display(), "starting jobberd");
    let handle = build_manager(&cfg)?.launch();
    serve(handle).await
}

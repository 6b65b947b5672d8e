//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum JobberError {
    /// A schedule field could not be parsed.
    #[error("invalid {field} spec '{text}': {reason}")]
    InvalidTimeSpec {
        /// Human-readable field name (e.g. "month day").
        field: &'static str,
        /// The offending text.
        text: String,
        /// What was wrong with it.
        reason: String,
    },
    /// The job file is structurally valid YAML but semantically wrong.
    #[error("invalid job file: {0}")]
    InvalidJobFile(String),
    /// The job file is not valid YAML for the expected schema.
    #[error("job file parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Filesystem or pipe failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A subprocess could not be launched or piped.
    #[error("exec error: {0}")]
    Exec(String),
    /// An administrative command named jobs that do not exist.
    #[error("no such jobs: {}", .0.join(", "))]
    NoSuchJobs(Vec<String>),
    /// A child context was requested from a canceled or finished context.
    #[error("context already canceled or finished")]
    ContextClosed,
    /// The job manager is no longer accepting commands.
    #[error("job manager stopped")]
    ManagerStopped,
    /// A run-log query used an out-of-range index or inverted bounds.
    #[error("invalid range: {0}")]
    InvalidRange(String),
    /// Daemon configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, JobberError>;

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = std::result::Result<T, anyhow::Error>;

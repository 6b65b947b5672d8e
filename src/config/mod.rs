//! Configuration: daemon settings and the YAML job file.

pub mod daemon;
pub mod job_file;

pub use daemon::{DaemonConfig, DEFAULT_RUN_LOG_MAX_LEN};
pub use job_file::{parse_job_file, SinkConfig, YamlJobFileLoader};

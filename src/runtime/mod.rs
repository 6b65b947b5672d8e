//! Runtime adapters: the process executor and the manager client API.

pub mod api;
pub mod shell;

pub use api::{format_job_table, ManagerHandle};
pub use shell::{ShellExecutor, DEFAULT_SHELL};

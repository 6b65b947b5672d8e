//! Infrastructure adapters: run-log storage and result sinks.

pub mod run_log;
pub mod sink;

pub use run_log::InMemoryRunLog;
pub use sink::{FilesystemResultSink, InMemoryResultSink, ProgramResultSink, StdoutResultSink};

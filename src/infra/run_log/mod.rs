//! Run log backends.

pub mod memory;

pub use memory::InMemoryRunLog;

//! Job loading seam.

use crate::core::{Job, Result};

/// Produces a fresh job set, typically by parsing a job file.
///
/// Called once at launch and again on every reload. Each call must return
/// new [`Job`] values so reloaded jobs start with clean state.
pub trait JobLoader: Send + Sync + 'static {
    /// Load the current job set.
    fn load(&self) -> Result<Vec<Job>>;
}

/// A loader that always returns clones of a fixed set of definitions.
pub struct StaticJobLoader {
    defs: Vec<crate::core::JobDef>,
}

impl StaticJobLoader {
    /// Serve `defs` on every load.
    #[must_use]
    pub const fn new(defs: Vec<crate::core::JobDef>) -> Self {
        Self { defs }
    }
}

impl JobLoader for StaticJobLoader {
    fn load(&self) -> Result<Vec<Job>> {
        Ok(self.defs.iter().cloned().map(Job::new).collect())
    }
}

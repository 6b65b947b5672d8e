//! In-memory result sink for embedding and tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{ResultSink, RunRec};

/// Keeps the most recent run records in a bounded buffer.
pub struct InMemoryResultSink {
    name: String,
    records: Mutex<VecDeque<RunRec>>,
    max_records: usize,
}

impl InMemoryResultSink {
    /// Create a sink called `name` holding at most `max_records` records.
    pub fn new(name: impl Into<String>, max_records: usize) -> Self {
        Self {
            name: name.into(),
            records: Mutex::new(VecDeque::with_capacity(max_records.min(1024))),
            max_records,
        }
    }

    /// Snapshot of stored records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<RunRec> {
        self.records.lock().iter().cloned().collect()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl ResultSink for InMemoryResultSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, rec: &RunRec) {
        let mut records = self.records.lock();
        if self.max_records == 0 {
            return;
        }
        if records.len() >= self.max_records {
            records.pop_front();
        }
        records.push_back(rec.clone());
    }
}

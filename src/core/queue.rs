//! Job queue ordered by next run time.
//!
//! A binary min-heap of jobs keyed by due time. Each job occupies at most one
//! slot; it is re-inserted with its following due time as soon as it is
//! popped, so a job is never dispatched twice for the same occurrence.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::Duration;
use tracing::{debug, trace};

use crate::core::next_run::next_run_time;
use crate::core::{Context, Job, JobStatus};
use crate::util::clock::{self, Instant};

/// Heap entry ordered earliest-due first, FIFO among equal due times.
struct Scheduled {
    due: Instant,
    seq: u64,
    job: Job,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for BinaryHeap (max-heap): earliest due wins.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of jobs by next run time.
#[derive(Default)]
pub struct JobQueue {
    heap: BinaryHeap<Scheduled>,
    seq: u64,
}

impl JobQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `jobs`, scheduled from `now`.
    ///
    /// Each job's `next_run_time` is updated. Failed jobs and jobs with no
    /// run time within the search horizon are left out.
    pub fn set_jobs(&mut self, now: Instant, jobs: &[Job]) {
        self.heap.clear();
        for job in jobs {
            let next = if job.status() == JobStatus::Failed {
                None
            } else {
                next_run_time(job.time(), now)
            };
            job.with_state(|s| s.next_run_time = next);
            match next {
                Some(due) => self.push(job.clone(), due),
                None => debug!(job = %job, "job has no upcoming run time"),
            }
        }
    }

    fn push(&mut self, job: Job, due: Instant) {
        self.seq += 1;
        self.heap.push(Scheduled {
            due,
            seq: self.seq,
            job,
        });
    }

    /// Number of scheduled jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no job is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Due time of the earliest job.
    #[must_use]
    pub fn peek_due(&self) -> Option<Instant> {
        self.heap.peek().map(|s| s.due)
    }

    /// Scheduled jobs as `(name, due)`, earliest first.
    #[must_use]
    pub fn schedule(&self) -> Vec<(String, Instant)> {
        let mut entries: Vec<&Scheduled> = self.heap.iter().collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries
            .into_iter()
            .map(|s| (s.job.name().to_owned(), s.due))
            .collect()
    }

    /// Wait for the next job that should run.
    ///
    /// Sleeps until the earliest job is due, reschedules it from one second
    /// past the wake-up time, and returns it if [`Job::should_run`] agrees;
    /// otherwise moves on to the next due job. Returns `None` once `ctx` is
    /// cancelled; a job popped while waiting is put back unchanged.
    pub async fn pop(&mut self, ctx: &Context, now: Instant) -> Option<Job> {
        let mut now = now;
        loop {
            if ctx.is_cancelled() {
                return None;
            }
            let Some(entry) = self.heap.pop() else {
                ctx.cancelled().await;
                return None;
            };

            if entry.due > now {
                let wait = clock::until(now, entry.due);
                trace!(job = %entry.job, ?wait, "sleeping until job is due");
                tokio::select! {
                    () = tokio::time::sleep(wait) => {
                        now = clock::now().max(entry.due);
                    }
                    () = ctx.cancelled() => {
                        self.heap.push(entry);
                        return None;
                    }
                }
            }

            let job = entry.job;
            let next = if job.status() == JobStatus::Failed {
                None
            } else {
                next_run_time(job.time(), now + Duration::seconds(1))
            };
            job.with_state(|s| s.next_run_time = next);
            if let Some(due) = next {
                self.push(job.clone(), due);
            }

            if job.should_run() {
                return Some(job);
            }
            debug!(job = %job, status = %job.status(), "skipping scheduled run");
        }
    }
}

//! Result sink abstraction.

use async_trait::async_trait;

use crate::core::RunRec;

/// Receives run records the owning job asked to be notified about.
///
/// Delivery is fire-and-forget: sinks log their own failures and never
/// report them back to the scheduler.
#[async_trait]
pub trait ResultSink: Send + Sync + 'static {
    /// Short identifier shown in job listings.
    fn name(&self) -> &str;

    /// Deliver one run record.
    async fn handle(&self, rec: &RunRec);
}

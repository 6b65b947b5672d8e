//! Result sink that prints run records to the daemon's stdout.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use super::{run_rec_line, SinkData};
use crate::core::{ResultSink, RunRec};

/// Writes one JSON line per run record to stdout.
#[derive(Debug, Clone, Default)]
pub struct StdoutResultSink {
    data: SinkData,
}

impl StdoutResultSink {
    /// Sink including the selected streams.
    #[must_use]
    pub const fn new(data: SinkData) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ResultSink for StdoutResultSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn handle(&self, rec: &RunRec) {
        let line = run_rec_line(rec, self.data);
        if let Err(err) = write_line(&mut tokio::io::stdout(), &line).await {
            warn!(job = %rec.job, error = %err, "failed to write run record to stdout");
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, line: &[u8]) -> std::io::Result<()> {
    out.write_all(line).await?;
    out.flush().await
}

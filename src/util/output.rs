//! Captured-output helpers.
//!
//! Job output can be arbitrarily large, so capture keeps a bounded prefix and
//! keeps draining the pipe so the child never blocks on a full buffer.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Default per-stream capture limit (1 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Read `reader` to EOF, keeping at most `limit` bytes.
pub async fn read_bounded<R>(mut reader: R, limit: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let mut buf = [0_u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(kept);
        }
        let room = limit.saturating_sub(kept.len());
        kept.extend_from_slice(&buf[..n.min(room)]);
    }
}

/// Output bytes rendered for text transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OutputText {
    /// Valid UTF-8, passed through.
    Utf8(String),
    /// Anything else, base64-encoded.
    Base64(String),
}

impl OutputText {
    /// Render `bytes` as UTF-8 if possible, base64 otherwise.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(s) => Self::Utf8(s.to_owned()),
            Err(_) => Self::Base64(STANDARD.encode(bytes)),
        }
    }
}

//! Bounded capture of child process streams.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_SIZE: usize = 8 * 1024;

/// Strips leading and trailing whitespace from captured output.
#[must_use]
pub fn normalize(output: &str) -> &str {
    output.trim()
}

/// Bytes kept from a stream plus the total the stream produced.
#[derive(Debug, Default)]
pub(crate) struct CappedOutput {
    pub(crate) bytes: Vec<u8>,
    pub(crate) total_bytes: usize,
}

impl CappedOutput {
    pub(crate) fn truncated(&self) -> bool {
        self.total_bytes > self.bytes.len()
    }

    pub(crate) fn into_text(self) -> String {
        normalize(&String::from_utf8_lossy(&self.bytes)).to_owned()
    }
}

/// Reads `reader` to EOF, keeping at most `limit` bytes.
///
/// Bytes past the limit are still drained so the child never blocks on a
/// full pipe.
pub(crate) async fn read_capped<R>(reader: Option<R>, limit: usize) -> io::Result<CappedOutput>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(CappedOutput::default());
    };

    let mut output = CappedOutput::default();
    let mut chunk = vec![0_u8; CHUNK_SIZE];
    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        output.total_bytes += read;
        let room = limit.saturating_sub(output.bytes.len());
        output.bytes.extend_from_slice(&chunk[..read.min(room)]);
    }
    Ok(output)
}

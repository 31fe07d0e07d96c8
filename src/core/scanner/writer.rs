// src/core/scanner/writer.rs

use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::core::models::ResultLine;

/// A message on the result queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterMessage {
    Line(ResultLine),
    Shutdown,
}

/// Drains the result queue into `destination`, one newline-terminated line
/// per message, in arrival order.
///
/// Stops at `Shutdown` (or once every sender is gone) and returns the number
/// of lines written. After the first write error the remaining lines are
/// still drained but discarded, and the error is returned at the end.
pub async fn run_writer<W>(
    mut queue: UnboundedReceiver<WriterMessage>,
    destination: W,
    flush_each_line: bool,
) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut out = BufWriter::new(destination);
    let mut written = 0_u64;
    let mut failure: Option<io::Error> = None;

    while let Some(WriterMessage::Line(line)) = queue.recv().await {
        if failure.is_some() {
            continue;
        }
        match write_line(&mut out, &line, flush_each_line).await {
            Ok(()) => written += 1,
            Err(e) => failure = Some(e),
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }
    out.flush().await?;
    debug!(lines = written, "Result writer finished.");
    Ok(written)
}

async fn write_line<W>(out: &mut BufWriter<W>, line: &ResultLine, flush: bool) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(line.as_str().as_bytes()).await?;
    out.write_all(b"\n").await?;
    if flush {
        out.flush().await?;
    }
    Ok(())
}

//! Newline-delimited JSON bridge between a UI and the relay
//!
//! Each input line is a request envelope; each output line is either the
//! reply to a request (carrying its `id`) or a `statusUpdate` push.
//! Requests are served concurrently, so a start that is still retrying
//! does not hold up status queries. When input closes, outstanding replies
//! are still written before returning.

use std::io;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};

use crate::common::Result;

use super::message::{CommandReply, Envelope, Reply, ReplyEnvelope};
use super::RelayHandle;

/// Serve requests read from `input`, writing replies and pushes to `output`
pub async fn serve<R, W>(handle: &RelayHandle, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = LineReader::new(input);
    let mut updates = handle.subscribe();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ReplyEnvelope>();
    let mut reply_tx = Some(reply_tx);

    tracing::info!("Bridge ready");

    loop {
        tokio::select! {
            line = lines.next_line(), if reply_tx.is_some() => match line? {
                Some(line) => {
                    if let Some(tx) = &reply_tx {
                        dispatch(handle, line, tx.clone());
                    }
                }
                None => {
                    tracing::info!("Bridge input closed");
                    reply_tx = None;
                }
            },
            Some(reply) = reply_rx.recv() => write_line(&mut output, &reply).await?,
            update = updates.recv(), if reply_tx.is_some() => match update {
                Ok(update) => write_line(&mut output, &update).await?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Bridge fell behind on status updates");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            else => break,
        }
    }

    Ok(())
}

/// Newline-delimited input read as raw bytes, so a line that is not UTF-8
/// is answered like any other bad request instead of ending the input
struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Next line without its terminator, `None` at end of input.
    ///
    /// Bytes read before a cancelled call stay in `buf`, so this can be
    /// used as a `select!` branch.
    async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        let mut line = std::mem::take(&mut self.buf);
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

fn dispatch(handle: &RelayHandle, line: Vec<u8>, replies: mpsc::UnboundedSender<ReplyEnvelope>) {
    let line = match String::from_utf8(line) {
        Ok(line) => line,
        Err(e) => return reject(&replies, None, e),
    };
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => return reject(&replies, None, e),
    };
    // echoed even when the rest of the request is unusable
    let id = value.get("id").and_then(Value::as_u64);

    let envelope: Envelope = match serde_json::from_value(value) {
        Ok(envelope) => envelope,
        Err(e) => return reject(&replies, id, e),
    };

    tracing::debug!(id = ?envelope.id, request = ?envelope.request, "Bridge request");

    let handle = handle.clone();
    tokio::spawn(async move {
        let reply = handle.handle(envelope.request).await;
        let _ = replies.send(ReplyEnvelope {
            id: envelope.id,
            reply,
        });
    });
}

fn reject(
    replies: &mpsc::UnboundedSender<ReplyEnvelope>,
    id: Option<u64>,
    error: impl std::fmt::Display,
) {
    tracing::warn!(?id, error = %error, "Invalid bridge request");
    let _ = replies.send(ReplyEnvelope {
        id,
        reply: Reply::Command(CommandReply::failed(format!("Invalid request: {}", error))),
    });
}

async fn write_line<W, T>(output: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    output.write_all(&line).await?;
    output.flush().await?;
    Ok(())
}

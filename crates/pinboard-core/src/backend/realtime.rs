//! Change-feed subscription for the posts collection.
//!
//! The backend pushes insert/update/delete notifications for a watched table
//! over a server-sent-events stream. The payload carries no row data: a
//! notification only tells the client that the collection changed, and the
//! feed reacts by re-running a full load.

use std::pin::Pin;

use anyhow::{Context, Result, bail};
use futures_util::Stream;
use reqwest::Method;
use serde::Deserialize;

use super::errors::{BackendError, BackendErrorKind};
use super::BackendClient;

/// Kind of row mutation a change notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// One event from the change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Keepalive, no state change.
    Ping,
    /// A row in the watched table was mutated.
    Change { table: String, op: ChangeOp },
    /// Backend-reported stream error.
    Error { message: String },
}

/// Boxed stream of change events.
pub type ChangeEventStream = Pin<Box<dyn Stream<Item = Result<ChangeEvent>> + Send>>;

impl BackendClient {
    /// Opens a change-feed stream for the posts table.
    ///
    /// The stream stays open for the lifetime of the subscription; dropping
    /// it releases the connection. No reconnection is attempted here.
    pub async fn subscribe_changes(&self) -> Result<ChangeEventStream, BackendError> {
        let response = self
            .request(Method::GET, "/realtime/v1/changes")
            .query(&[("table", self.config().posts_table.as_str())])
            .header("accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| Self::classify_reqwest_error(BackendErrorKind::Persistence, e))?;

        let response = Self::check_status(BackendErrorKind::Persistence, response).await?;

        let byte_stream = response.bytes_stream();
        let event_stream = SseParser::new(byte_stream);
        Ok(Box::pin(event_stream))
    }
}

/// SSE parser that converts a byte stream into ChangeEvents.
pub struct SseParser<S> {
    inner: S,
    buffer: Vec<u8>,
}

impl<S> SseParser<S> {
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
        }
    }
}

impl<S, E> Stream for SseParser<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = Result<ChangeEvent>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        loop {
            // Check if we have a complete event in the buffer
            if let Some(event) = self.try_parse_event() {
                return Poll::Ready(Some(event));
            }

            // Try to get more data from the underlying stream
            let inner = Pin::new(&mut self.inner);
            match inner.poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    self.buffer.extend_from_slice(&bytes);
                    // Continue looping to parse
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(anyhow::anyhow!("Stream error: {}", e))));
                }
                Poll::Ready(None) => {
                    // Stream ended - check for any remaining buffered event
                    let is_empty = self.buffer.iter().all(|b| b.is_ascii_whitespace());
                    if is_empty {
                        return Poll::Ready(None);
                    }
                    if let Some(event) = self.try_parse_event() {
                        return Poll::Ready(Some(event));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl<S> SseParser<S> {
    /// Tries to parse a complete SSE event from the buffer.
    /// Returns None if no complete event is available yet.
    fn try_parse_event(&mut self) -> Option<Result<ChangeEvent>> {
        // SSE events are separated by double newlines
        // Handle both LF (\n\n) and CRLF (\r\n\r\n) line endings
        let (event_end, delim_len) = find_double_newline(&self.buffer)?;

        // Extract the event bytes and remove from buffer
        let event_bytes: Vec<u8> = self.buffer.drain(..event_end).collect();
        self.buffer.drain(..delim_len); // remove the delimiter

        // Decode UTF-8 only after we have the complete event
        let event_text = match std::str::from_utf8(&event_bytes) {
            Ok(s) => s,
            Err(e) => return Some(Err(anyhow::anyhow!("Invalid UTF-8 in SSE event: {}", e))),
        };

        Some(parse_sse_event(event_text))
    }
}

/// Parses a single SSE event block into a ChangeEvent.
pub fn parse_sse_event(event_text: &str) -> Result<ChangeEvent> {
    let mut event_type = None;
    let mut data = None;

    for line in event_text.lines() {
        if let Some(value) = line.strip_prefix("event: ") {
            event_type = Some(value.trim());
        } else if let Some(value) = line.strip_prefix("data: ") {
            data = Some(value);
        }
    }

    let event_type = event_type.unwrap_or("change");

    match event_type {
        "ping" => Ok(ChangeEvent::Ping),
        "change" => {
            let data = data.context("Missing data for change event")?;
            let parsed: SseChange =
                serde_json::from_str(data).context("Failed to parse change event")?;
            let op = match parsed.change_type.as_str() {
                "INSERT" => ChangeOp::Insert,
                "UPDATE" => ChangeOp::Update,
                "DELETE" => ChangeOp::Delete,
                other => bail!("Unknown change type: {}", other),
            };
            Ok(ChangeEvent::Change {
                table: parsed.table,
                op,
            })
        }
        "error" => {
            let data = data.context("Missing data for error event")?;
            let parsed: SseError = serde_json::from_str(data).context("Failed to parse error")?;
            Ok(ChangeEvent::Error {
                message: parsed.message,
            })
        }
        other => bail!("Unknown change feed event type: {}", other),
    }
}

#[derive(Debug, Deserialize)]
struct SseChange {
    table: String,
    #[serde(rename = "type")]
    change_type: String,
}

#[derive(Debug, Deserialize)]
struct SseError {
    message: String,
}

/// Finds the position of a double newline in the buffer.
/// Handles both LF (\n\n) and CRLF (\r\n\r\n) line endings.
/// Returns the position and the length of the delimiter (2 or 4 bytes).
fn find_double_newline(buffer: &[u8]) -> Option<(usize, usize)> {
    let crlf_pos = buffer.windows(4).position(|w| w == b"\r\n\r\n");
    let lf_pos = buffer.windows(2).position(|w| w == b"\n\n");

    match (crlf_pos, lf_pos) {
        (Some(c), Some(l)) => {
            // Return whichever comes first
            if l <= c { Some((l, 2)) } else { Some((c, 4)) }
        }
        (Some(c), None) => Some((c, 4)),
        (None, Some(l)) => Some((l, 2)),
        (None, None) => None,
    }
}

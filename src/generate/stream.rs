//! SSE parser for `streamGenerateContent?alt=sse`
//!
//! Turns the raw response byte stream into text deltas. Lines are buffered
//! as bytes so a multi-byte character split across chunks decodes intact.

use crate::generate::gemini::GenerateResponse;
use crate::LlmsError;
use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stream of text deltas from one streamed generation
///
/// Finite and not restartable. Ends with an `AI_ERROR` item if the model
/// produced no text at all or stopped for a reason other than completion.
pub struct GeminiStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    buffer: Vec<u8>,
    emitted_text: bool,
    done: bool,
}

impl GeminiStream {
    pub(crate) fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: Vec::new(),
            emitted_text: false,
            done: false,
        }
    }

    /// Handles a parsed item: records text, ends the stream after errors
    fn settle(
        &mut self,
        item: Result<String, LlmsError>,
    ) -> Poll<Option<Result<String, LlmsError>>> {
        match item {
            Ok(text) => {
                self.emitted_text = true;
                Poll::Ready(Some(Ok(text)))
            }
            Err(e) => {
                self.done = true;
                Poll::Ready(Some(Err(e)))
            }
        }
    }
}

impl Stream for GeminiStream {
    type Item = Result<String, LlmsError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.done {
            return Poll::Ready(None);
        }

        loop {
            if let Some(item) = next_delta(&mut this.buffer, false) {
                return this.settle(item);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    this.done = true;
                    let message = format!("stream interrupted: {}", e);
                    return Poll::Ready(Some(Err(LlmsError::Ai(message))));
                }
                Poll::Ready(None) => {
                    // Flush a final line without a trailing newline
                    if let Some(item) = next_delta(&mut this.buffer, true) {
                        return this.settle(item);
                    }
                    this.done = true;
                    if !this.emitted_text {
                        let error = LlmsError::Ai("empty response".to_string());
                        return Poll::Ready(Some(Err(error)));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Pops complete lines off `buffer` until one yields a non-empty delta
///
/// With `at_end`, a trailing partial line is treated as complete.
fn next_delta(buffer: &mut Vec<u8>, at_end: bool) -> Option<Result<String, LlmsError>> {
    loop {
        let line: Vec<u8> = match buffer.iter().position(|b| *b == b'\n') {
            Some(pos) => buffer.drain(..=pos).collect(),
            None if at_end && !buffer.is_empty() => std::mem::take(buffer),
            None => return None,
        };

        let line = match std::str::from_utf8(&line) {
            Ok(line) => line.trim(),
            Err(e) => {
                return Some(Err(LlmsError::Ai(format!("invalid UTF-8 in stream: {}", e))));
            }
        };

        // Blank separators and non-data fields (event:, id:, retry:)
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };

        let parsed: GenerateResponse = match serde_json::from_str(data.trim()) {
            Ok(parsed) => parsed,
            Err(e) => return Some(Err(LlmsError::Ai(format!("invalid stream event: {}", e)))),
        };

        match parsed.into_text() {
            Ok(text) if text.is_empty() => continue,
            other => return Some(other),
        }
    }
}

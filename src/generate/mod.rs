//! Formatting service: extracted text in, Markdown out
//!
//! This module handles:
//! - The fixed instruction prompt and single-page front matter
//! - A Gemini-backed formatter, one-shot and streaming
//! - Collecting a stream of text deltas into one document

mod gemini;
mod prompt;
mod stream;

pub use gemini::GeminiFormatter;
pub use prompt::{build_prompt, format_document, front_matter};
pub use stream::GeminiStream;

use crate::LlmsError;
use async_trait::async_trait;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Lazy, finite sequence of Markdown text deltas
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmsError>> + Send>>;

/// External service that turns plain page text into Markdown
#[async_trait]
pub trait Formatter: Send + Sync {
    /// Formats `content` in one request
    ///
    /// Fails with `LlmsError::Ai` when the service reports an error or
    /// returns no text.
    async fn format(&self, content: &str) -> Result<String, LlmsError>;

    /// Formats `content` as a stream of deltas
    ///
    /// Cancelling `cancel` ends the stream and drops the underlying
    /// subscription.
    async fn format_stream(
        &self,
        content: &str,
        cancel: CancellationToken,
    ) -> Result<TextStream, LlmsError>;
}

/// Concatenates deltas in arrival order, stopping at the first error
pub async fn collect_stream(mut stream: TextStream) -> Result<String, LlmsError> {
    let mut text = String::new();
    while let Some(delta) = stream.next().await {
        text.push_str(&delta?);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_stream_stops_at_error() {
        let items: Vec<Result<String, LlmsError>> = vec![
            Ok("a".to_string()),
            Err(LlmsError::Ai("boom".to_string())),
            Ok("b".to_string()),
        ];
        let stream: TextStream = Box::pin(futures::stream::iter(items));

        assert!(collect_stream(stream).await.is_err());
    }

    #[tokio::test]
    async fn test_collect_stream_concatenates() {
        let items: Vec<Result<String, LlmsError>> =
            vec![Ok("# T".to_string()), Ok("itle".to_string())];
        let stream: TextStream = Box::pin(futures::stream::iter(items));

        assert_eq!(collect_stream(stream).await.unwrap(), "# Title");
    }
}

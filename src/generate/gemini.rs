//! Gemini REST formatter
//!
//! Talks to the `generateContent` and `streamGenerateContent` endpoints of
//! the Generative Language API with a plain reqwest client.

use crate::config::GeneratorConfig;
use crate::generate::prompt::build_prompt;
use crate::generate::stream::GeminiStream;
use crate::generate::{Formatter, TextStream};
use crate::LlmsError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Finish reasons that still carry a usable answer
const ACCEPTED_FINISH_REASONS: &[&str] = &["STOP", "MAX_TOKENS", "FINISH_REASON_UNSPECIFIED"];

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response body of `generateContent`, and of each streamed event
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,

    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,

    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, failing on blocked or aborted output
    ///
    /// The text may be empty; streamed events often carry only metadata.
    pub(crate) fn into_text(self) -> Result<String, LlmsError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmsError::Ai(format!("prompt blocked: {}", reason)));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(String::new());
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if !ACCEPTED_FINISH_REASONS.contains(&reason) {
                return Err(LlmsError::Ai(format!("generation stopped: {}", reason)));
            }
        }

        Ok(candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

/// Formatter backed by a Gemini model
#[derive(Debug)]
pub struct GeminiFormatter {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretBox<str>>,
}

impl GeminiFormatter {
    /// Creates a formatter with an explicit API key
    pub fn new(client: Client, config: &GeneratorConfig, api_key: impl Into<String>) -> Self {
        let key: String = api_key.into();
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: Some(SecretBox::new(Box::from(key.as_str()))),
        }
    }

    /// Creates a formatter reading its key from `config.api_key_env`
    ///
    /// A missing variable is not an error here; every formatting call will
    /// fail with `AI_ERROR` instead, so link discovery and multi-page runs
    /// keep working without a key.
    pub fn from_env(client: Client, config: &GeneratorConfig) -> Self {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Self::new(client, config, key),
            _ => {
                tracing::warn!(
                    "{} is not set; single-page formatting is unavailable",
                    config.api_key_env
                );
                Self {
                    client,
                    endpoint: config.endpoint.trim_end_matches('/').to_string(),
                    model: config.model.clone(),
                    api_key: None,
                }
            }
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.endpoint, self.model, method)
    }

    async fn post(&self, url: &str, content: &str) -> Result<Response, LlmsError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| LlmsError::Ai("API key not configured".to_string()))?;

        let prompt = build_prompt(content);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: &prompt }],
            }],
        };

        tracing::debug!("POST {} ({} chars of content)", url, content.len());

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmsError::Ai(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("Gemini returned HTTP {}: {}", status.as_u16(), truncate(&detail, 200));
            return Err(LlmsError::Ai(format!("HTTP {}", status.as_u16())));
        }

        Ok(response)
    }
}

#[async_trait]
impl Formatter for GeminiFormatter {
    async fn format(&self, content: &str) -> Result<String, LlmsError> {
        let response = self.post(&self.method_url("generateContent"), content).await?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmsError::Ai(format!("invalid response: {}", e)))?;

        let text = parsed.into_text()?;
        if text.trim().is_empty() {
            return Err(LlmsError::Ai("empty response".to_string()));
        }

        Ok(text)
    }

    async fn format_stream(
        &self,
        content: &str,
        cancel: CancellationToken,
    ) -> Result<TextStream, LlmsError> {
        let url = format!("{}?alt=sse", self.method_url("streamGenerateContent"));
        let response = self.post(&url, content).await?;

        let stream =
            GeminiStream::new(response.bytes_stream()).take_until(cancel.cancelled_owned());
        Ok(Box::pin(stream))
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::collect_stream;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: &str) -> GeneratorConfig {
        GeneratorConfig {
            endpoint: endpoint.to_string(),
            model: "gemini-test".to_string(),
            api_key_env: "LLMSTXT_TEST_UNSET_KEY".to_string(),
        }
    }

    fn formatter(server: &MockServer) -> GeminiFormatter {
        GeminiFormatter::new(Client::new(), &config(&server.uri()), "test-key")
    }

    #[tokio::test]
    async fn test_format_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("Here is the webpage content: page text"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": "# Title\n"}, {"text": "Body"}], "role": "model"},
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let text = formatter(&server).format("page text").await.unwrap();
        assert_eq!(text, "# Title\nBody");
    }

    #[tokio::test]
    async fn test_safety_stop_is_ai_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let err = formatter(&server).format("x").await.unwrap_err();
        assert!(matches!(err, LlmsError::Ai(_)));
    }

    #[tokio::test]
    async fn test_empty_text_is_ai_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "  "}]}, "finishReason": "STOP"}]
            })))
            .mount(&server)
            .await;

        let err = formatter(&server).format("x").await.unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::AiError);
    }

    #[tokio::test]
    async fn test_http_error_is_ai_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = formatter(&server).format("x").await.unwrap_err();
        assert!(matches!(err, LlmsError::Ai(_)));
    }

    #[tokio::test]
    async fn test_missing_key_is_ai_error() {
        let server = MockServer::start().await;
        let formatter = GeminiFormatter::from_env(Client::new(), &config(&server.uri()));

        let err = formatter.format("x").await.unwrap_err();
        assert!(matches!(err, LlmsError::Ai(_)));
    }

    #[tokio::test]
    async fn test_stream_concatenates_deltas() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}]}}]}\r\n\r\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\", world\"}]},\"finishReason\":\"STOP\"}]}\r\n\r\n",
        );
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:streamGenerateContent"))
            .and(query_param("alt", "sse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let stream = formatter(&server)
            .format_stream("x", CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(collect_stream(stream).await.unwrap(), "Hello, world");
    }

    #[tokio::test]
    async fn test_cancelled_stream_ends_early() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi\"}]}}]}\n\n"),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let stream = formatter(&server).format_stream("x", cancel).await.unwrap();
        assert_eq!(collect_stream(stream).await.unwrap(), "");
    }

    #[test]
    fn test_blocked_prompt() {
        let parsed: GenerateResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(parsed.into_text().is_err());
    }
}

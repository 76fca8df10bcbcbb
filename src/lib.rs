//! llmstxt: turn web pages into clean Markdown for language models
//!
//! This crate fetches a page (or a set of same-site pages), extracts the
//! substantive text from the HTML, and assembles it into a Markdown document
//! suitable as LLM context. The single-page path hands the extracted text to a
//! formatting service; the multi-page path concatenates every selected page
//! into one `llms-full` artifact written through an export sink.

pub mod config;
pub mod crawler;
pub mod export;
pub mod extract;
pub mod generate;
pub mod pipeline;
pub mod ratelimit;
pub mod service;
pub mod state;
pub mod url;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable, caller-visible error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidUrl,
    FetchError,
    ParseError,
    AiError,
    RateLimitExceeded,
    ValidationError,
    NetworkError,
}

impl ErrorCode {
    /// Returns the wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "INVALID_URL",
            Self::FetchError => "FETCH_ERROR",
            Self::ParseError => "PARSE_ERROR",
            Self::AiError => "AI_ERROR",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
        }
    }

    /// Returns the fixed message shown to users for this code
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "The provided URL is invalid. Please enter a valid URL.",
            Self::FetchError => {
                "Failed to fetch the webpage. Please check the URL and your internet connection."
            }
            Self::ParseError => {
                "No content found on webpage. The page might be empty or require JavaScript to load."
            }
            Self::AiError => {
                "Failed to generate markdown content. The AI model encountered an error."
            }
            Self::RateLimitExceeded => {
                "Your daily limit has been reached. Please try again tomorrow."
            }
            Self::ValidationError => "The request is invalid. Please check your input.",
            Self::NetworkError => {
                "A network error occurred while contacting the website. Please try again."
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{message, code}` pair returned on every abort path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: ErrorCode,
}

/// Main error type for llmstxt operations
#[derive(Debug, Error)]
pub enum LlmsError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Failed to fetch {url}{}", status_suffix(.status))]
    Fetch { url: String, status: Option<u16> },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("No content could be extracted from {url}")]
    Parse { url: String },

    #[error("Formatting service error: {0}")]
    Ai(String),

    #[error("Rate limit exceeded for {identifier}")]
    RateLimited { identifier: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Export error: {0}")]
    Export(#[from] export::ExportError),

    #[error("Rate gate error: {0}")]
    RateGate(#[from] ratelimit::RateGateError),

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

impl LlmsError {
    /// Maps the error onto its stable code
    ///
    /// Internal failures (export, gate storage, client construction) have no
    /// dedicated code and surface as `PARSE_ERROR`, the generic
    /// "unexpected error" bucket.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidUrl(_) => ErrorCode::InvalidUrl,
            Self::Fetch { .. } => ErrorCode::FetchError,
            Self::Network { .. } => ErrorCode::NetworkError,
            Self::Parse { .. } => ErrorCode::ParseError,
            Self::Ai(_) => ErrorCode::AiError,
            Self::RateLimited { .. } => ErrorCode::RateLimitExceeded,
            Self::Validation(_) | Self::Config(_) => ErrorCode::ValidationError,
            Self::Export(_) | Self::RateGate(_) | Self::Client(_) => ErrorCode::ParseError,
        }
    }

    /// Whether the fetch retry loop should try again after this error
    ///
    /// Only transport failures qualify. An HTTP status or a refused redirect
    /// is the server's definitive answer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Builds the user-facing `{message, code}` pair
    ///
    /// The message is the fixed text for the code; internal details never
    /// leak into it.
    pub fn to_response(&self) -> ErrorResponse {
        let code = self.code();
        let message = match self {
            Self::Export(_) | Self::RateGate(_) | Self::Client(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
            _ => code.user_message().to_string(),
        };
        ErrorResponse { message, code }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" (HTTP {})", code))
        .unwrap_or_default()
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL sanitization errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Local and private hosts are not allowed: {0}")]
    BlockedHost(String),
}

/// Result type alias for llmstxt operations
pub type Result<T> = std::result::Result<T, LlmsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::url::{sanitize_url, SanitizedUrl};
pub use config::Config;
pub use crawler::{discover_links, retry, LinkEntry, RetryPolicy};
pub use extract::{extract_content, ExtractedContent, Extractor};
pub use pipeline::{AggregateResult, Aggregator, PageOutcome, ProgressEvent};
pub use ratelimit::{resolve_identifier, RateDecision, RateGate};
pub use service::LlmsService;
pub use state::PageState;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_map_to_wire_strings() {
        let err = LlmsError::Fetch {
            url: "https://example.com/".to_string(),
            status: Some(404),
        };
        assert_eq!(err.code(), ErrorCode::FetchError);
        assert_eq!(err.code().as_str(), "FETCH_ERROR");
        assert_eq!(
            LlmsError::RateLimited {
                identifier: "1.2.3.4".to_string()
            }
            .code()
            .as_str(),
            "RATE_LIMIT_EXCEEDED"
        );
        assert_eq!(
            LlmsError::InvalidUrl(UrlError::MissingHost).code().as_str(),
            "INVALID_URL"
        );
    }

    #[test]
    fn test_response_hides_internal_details() {
        let err = LlmsError::Network {
            url: "https://example.com/".to_string(),
            message: "dns error: lookup failed for internal-host".to_string(),
        };
        let response = err.to_response();
        assert_eq!(response.code, ErrorCode::NetworkError);
        assert!(!response.message.contains("internal-host"));
    }

    #[test]
    fn test_response_serializes_code() {
        let response = LlmsError::Parse {
            url: "https://example.com/".to_string(),
        }
        .to_response();
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"code\":\"PARSE_ERROR\""));
        assert!(json.contains("No content found on webpage"));
    }

    #[test]
    fn test_fetch_error_display_includes_status() {
        let err = LlmsError::Fetch {
            url: "https://example.com/".to_string(),
            status: Some(503),
        };
        assert_eq!(err.to_string(), "Failed to fetch https://example.com/ (HTTP 503)");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(LlmsError::Network {
            url: String::new(),
            message: String::new()
        }
        .is_retryable());
        assert!(!LlmsError::Fetch {
            url: String::new(),
            status: None
        }
        .is_retryable());
        assert!(!LlmsError::Fetch {
            url: String::new(),
            status: Some(502)
        }
        .is_retryable());
        assert!(!LlmsError::Parse { url: String::new() }.is_retryable());
        assert!(!LlmsError::Ai("empty".to_string()).is_retryable());
    }
}

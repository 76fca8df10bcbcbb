//! HTTP fetcher implementation
//!
//! This module handles all outbound page requests, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Refusing redirects that lead to local or private hosts
//! - Wrapping every request in the retry executor
//! - Classifying failures into fetch (HTTP status) and network errors

use crate::config::FetcherConfig;
use crate::crawler::retry::{retry_when, RetryPolicy};
use crate::url::{sanitize_url_with, SanitizeOptions};
use crate::LlmsError;
use reqwest::{redirect::Policy, Client, Response};

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// A page that came back with a 2xx status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,

    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value (empty when absent)
    pub content_type: String,

    /// Decoded response body
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed up to a fixed limit, and every hop is re-checked
/// against the host guard so a public URL cannot bounce the fetcher onto an
/// internal address.
///
/// # Example
///
/// ```no_run
/// use llmstxt::config::FetcherConfig;
/// use llmstxt::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    let options = SanitizeOptions {
        allow_private_hosts: config.allow_private_hosts,
    };

    let redirect_policy = Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match sanitize_url_with(attempt.url().as_str(), &options) {
            Ok(_) => attempt.follow(),
            Err(e) => attempt.error(e),
        }
    });

    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .redirect(redirect_policy)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page, retrying transport failures per `policy`
///
/// # Failure Mapping
///
/// | Condition | Result |
/// |-----------|--------|
/// | Transport failure, retries left | Back off and retry |
/// | Transport failure, budget spent | `LlmsError::Network` |
/// | Redirect refused | `LlmsError::Fetch` without status (not retried) |
/// | Non-2xx status | `LlmsError::Fetch` with status (not retried) |
/// | Body read failure | `LlmsError::Network` |
pub async fn fetch_page(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
) -> Result<FetchedPage, LlmsError> {
    let response =
        retry_when(policy, || send_request(client, url), LlmsError::is_retryable).await?;

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        tracing::debug!("{} answered HTTP {}", url, status.as_u16());
        return Err(LlmsError::Fetch {
            url: url.to_string(),
            status: Some(status.as_u16()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response
        .text()
        .await
        .map_err(|e| classify_error(url, e))?;

    Ok(FetchedPage {
        url: url.to_string(),
        final_url,
        status_code: status.as_u16(),
        content_type,
        body,
    })
}

/// Issues one GET request; any HTTP status counts as success here
async fn send_request(client: &Client, url: &str) -> Result<Response, LlmsError> {
    client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_error(url, e))
}

/// Maps a reqwest error onto the crate taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> LlmsError {
    if error.is_redirect() {
        return LlmsError::Fetch {
            url: url.to_string(),
            status: None,
        };
    }

    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection failed".to_string()
    } else {
        error.to_string()
    };

    LlmsError::Network {
        url: url.to_string(),
        message,
    }
}

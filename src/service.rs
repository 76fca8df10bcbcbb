//! Request-level facade over the pipeline
//!
//! `LlmsService` wires the rate gate, sanitizer, fetcher, extractor, formatter
//! and export sink together. Every public operation is one logical request:
//! it consults the gate exactly once, before anything touches the network.

use crate::config::{validate, Config};
use crate::crawler::{build_http_client, discover_links, fetch_page, LinkEntry, RetryPolicy};
use crate::export::{ExportSink, FileExportSink};
use crate::extract::{ExtractedContent, Extractor};
use crate::generate::{format_document, front_matter, Formatter, GeminiFormatter, TextStream};
use crate::pipeline::{AggregateResult, Aggregator, ProgressEvent};
use crate::ratelimit::{build_rate_gate, RateDecision, RateGate};
use crate::url::{sanitize_url_with, SanitizeOptions, SanitizedUrl};
use crate::LlmsError;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Generation requests can run long; page fetches use the fetcher timeout
const FORMATTER_TIMEOUT: Duration = Duration::from_secs(120);

/// Entry point for single-page, link discovery and multi-page requests
pub struct LlmsService {
    config: Config,
    client: Client,
    gate: Arc<dyn RateGate>,
    formatter: Arc<dyn Formatter>,
    extractor: Arc<Extractor>,
    aggregator: Aggregator,
    retry: RetryPolicy,
    sanitize: SanitizeOptions,
}

impl LlmsService {
    /// Creates a service from explicit collaborators
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate or the HTTP client cannot be built.
    pub fn new(
        config: Config,
        gate: Arc<dyn RateGate>,
        formatter: Arc<dyn Formatter>,
        sink: Arc<dyn ExportSink>,
    ) -> Result<Self, LlmsError> {
        validate(&config)?;

        let client = build_http_client(&config.fetcher).map_err(LlmsError::Client)?;
        let extractor = Arc::new(Extractor::new(config.extraction.min_content_length));
        let retry = RetryPolicy::from(&config.retry);
        let aggregator = Aggregator::new(client.clone(), extractor.clone(), retry, sink);
        let sanitize = SanitizeOptions {
            allow_private_hosts: config.fetcher.allow_private_hosts,
        };

        if sanitize.allow_private_hosts {
            tracing::warn!("Private and loopback hosts are allowed; do not expose this instance");
        }

        Ok(Self {
            config,
            client,
            gate,
            formatter,
            extractor,
            aggregator,
            retry,
            sanitize,
        })
    }

    /// Creates a service with the collaborators described by `config`
    ///
    /// Uses the SQLite or in-memory gate per `[rate-limit]`, a Gemini
    /// formatter keyed from the environment, and a file export sink.
    pub fn from_config(config: Config) -> Result<Self, LlmsError> {
        let gate = build_rate_gate(&config.rate_limit)?;

        let formatter_client = Client::builder()
            .timeout(FORMATTER_TIMEOUT)
            .build()
            .map_err(LlmsError::Client)?;
        let formatter = Arc::new(GeminiFormatter::from_env(formatter_client, &config.generator));

        let sink = Arc::new(FileExportSink::new(
            config.export.directory.clone(),
            config.export.url_prefix.clone(),
        ));

        Self::new(config, gate, formatter, sink)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches one page and returns it formatted as Markdown with front matter
    ///
    /// # Errors
    ///
    /// * `RateLimited` - the gate rejected `identifier`
    /// * `InvalidUrl` - `url` failed sanitization
    /// * `Fetch` / `Network` - the page could not be fetched
    /// * `Parse` - no content could be extracted
    /// * `Ai` - the formatter failed or returned nothing
    pub async fn generate_single(&self, url: &str, identifier: &str) -> Result<String, LlmsError> {
        self.admit(identifier).await?;
        let (url, extracted) = self.fetch_and_extract(url).await?;

        tracing::info!("Formatting {} ({} chars)", url, extracted.content.len());
        let markdown = self.formatter.format(&extracted.content).await?;

        Ok(format_document(
            &extracted.title,
            url.as_str(),
            Utc::now(),
            &markdown,
        ))
    }

    /// Streaming variant of [`generate_single`](Self::generate_single)
    ///
    /// The first item is the front matter, followed by the formatter's text
    /// deltas. Cancelling `cancel` ends the stream.
    pub async fn generate_single_stream(
        &self,
        url: &str,
        identifier: &str,
        cancel: CancellationToken,
    ) -> Result<TextStream, LlmsError> {
        self.admit(identifier).await?;
        let (url, extracted) = self.fetch_and_extract(url).await?;

        tracing::info!("Streaming format of {} ({} chars)", url, extracted.content.len());
        let deltas = self.formatter.format_stream(&extracted.content, cancel).await?;

        let header = front_matter(&extracted.title, url.as_str(), Utc::now());
        Ok(Box::pin(stream::once(async move { Ok(header) }).chain(deltas)))
    }

    /// Lists same-origin links on the page at `url`, the page itself first
    pub async fn discover_links(
        &self,
        url: &str,
        identifier: &str,
    ) -> Result<Vec<LinkEntry>, LlmsError> {
        self.admit(identifier).await?;
        let seed = self.sanitize(url)?;

        let page = fetch_page(&self.client, seed.as_str(), &self.retry).await?;
        let links = discover_links(seed.as_url(), &page.body);

        tracing::info!("Discovered {} links on {}", links.len(), seed);
        Ok(links)
    }

    /// Aggregates the selected URLs into one exported document
    ///
    /// Every URL is sanitized before the run starts; one bad URL rejects the
    /// whole request. Page-level failures inside the run do not.
    pub async fn generate_full(
        &self,
        urls: &[String],
        identifier: &str,
        progress: Option<UnboundedSender<ProgressEvent>>,
        cancel: &CancellationToken,
    ) -> Result<AggregateResult, LlmsError> {
        self.admit(identifier).await?;

        if urls.is_empty() {
            return Err(LlmsError::Validation("no URLs selected".to_string()));
        }

        let selected = urls
            .iter()
            .map(|url| self.sanitize(url).map(|u| u.as_str().to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        self.aggregator.aggregate(&selected, progress, cancel).await
    }

    /// Requests left for `identifier` in the current window
    pub async fn remaining(&self, identifier: &str) -> Result<u32, LlmsError> {
        Ok(self.gate.remaining(identifier).await?)
    }

    async fn admit(&self, identifier: &str) -> Result<RateDecision, LlmsError> {
        let decision = self.gate.limit(identifier).await?;

        if !decision.allowed {
            tracing::warn!("Rate limit exceeded for {}", identifier);
            return Err(LlmsError::RateLimited {
                identifier: identifier.to_string(),
            });
        }

        tracing::debug!("{} admitted, {} remaining", identifier, decision.remaining);
        Ok(decision)
    }

    fn sanitize(&self, url: &str) -> Result<SanitizedUrl, LlmsError> {
        sanitize_url_with(url, &self.sanitize).map_err(|e| {
            tracing::debug!("Rejected URL {:?}: {}", url, e);
            LlmsError::InvalidUrl(e)
        })
    }

    async fn fetch_and_extract(
        &self,
        url: &str,
    ) -> Result<(SanitizedUrl, ExtractedContent), LlmsError> {
        let url = self.sanitize(url)?;
        let page = fetch_page(&self.client, url.as_str(), &self.retry).await?;

        let extracted = self.extractor.extract(&page.body);
        if extracted.is_empty() {
            return Err(LlmsError::Parse {
                url: url.to_string(),
            });
        }

        Ok((url, extracted))
    }
}

//! Sequential multi-page aggregation
//!
//! Drives each selected URL through fetch, extraction and append, one page at
//! a time, writing the growing document to an export sink. Individual page
//! failures are recorded and skipped; only sink failures abort a run.

use crate::crawler::{fetch_page, RetryPolicy};
use crate::export::{export_file_name, ExportSink};
use crate::extract::{ExtractedContent, Extractor};
use crate::pipeline::document::DocumentBuilder;
use crate::pipeline::progress::{AggregationState, PageOutcome, ProgressEvent};
use crate::state::PageState;
use crate::LlmsError;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Everything a finished (or cancelled) run produced
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    /// Full document text, identical to what was written to the sink
    pub document: String,

    /// One outcome per selected URL, in submission order
    pub outcomes: Vec<PageOutcome>,

    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,

    /// True if the run stopped early on request
    pub cancelled: bool,

    pub elapsed_ms: u64,

    /// Sink artifact name
    pub file_name: String,

    /// Address returned by the sink for the finished artifact
    pub download_url: String,
}

impl AggregateResult {
    /// URLs that ended in the given state
    pub fn urls_in_state(&self, state: PageState) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.state == state)
            .map(|o| o.url.as_str())
            .collect()
    }
}

/// Runs aggregation over caller-selected URLs
///
/// Cheap to share: each run owns its own state, so one `Aggregator` can
/// serve concurrent runs.
pub struct Aggregator {
    client: Client,
    extractor: Arc<Extractor>,
    retry: RetryPolicy,
    sink: Arc<dyn ExportSink>,
}

impl Aggregator {
    pub fn new(
        client: Client,
        extractor: Arc<Extractor>,
        retry: RetryPolicy,
        sink: Arc<dyn ExportSink>,
    ) -> Self {
        Self {
            client,
            extractor,
            retry,
            sink,
        }
    }

    /// Aggregates `urls` into one document
    ///
    /// # Arguments
    ///
    /// * `urls` - Selected URLs, processed strictly in this order
    /// * `progress` - Optional channel receiving one event per processed URL
    /// * `cancel` - Checked before each URL; once cancelled, the remaining
    ///   URLs stay `Pending` and the partial document is still finished
    ///
    /// # Returns
    ///
    /// * `Ok(AggregateResult)` - The run completed, possibly with page failures
    /// * `Err(LlmsError::Export)` - The sink could not be written
    pub async fn aggregate(
        &self,
        urls: &[String],
        progress: Option<UnboundedSender<ProgressEvent>>,
        cancel: &CancellationToken,
    ) -> Result<AggregateResult, LlmsError> {
        let file_name = export_file_name();
        self.sink.create(&file_name).await?;

        let mut state = AggregationState::new(urls);
        let mut builder = DocumentBuilder::new();
        let total = state.total();
        let mut cancelled = false;

        tracing::info!("Starting full content generation for {} URLs", total);

        for index in 0..total {
            if cancel.is_cancelled() {
                tracing::info!(
                    "Aggregation cancelled after {}/{} links",
                    state.processed(),
                    total
                );
                cancelled = true;
                break;
            }

            let current = index + 1;
            let page_start = Instant::now();

            let Some(outcome) = state.outcome_mut(index) else {
                break;
            };
            tracing::info!("[{}/{}] Fetching: {}", current, total, outcome.url);

            if let Some(extracted) = self.process_page(outcome).await {
                let chunk = builder.add_page(&extracted.title, &outcome.url, &extracted.content);
                self.sink.append(&file_name, chunk.as_bytes()).await?;
                outcome.advance(PageState::Appended);
            }

            let page_elapsed = page_start.elapsed();
            outcome.elapsed_ms = page_elapsed.as_millis() as u64;

            if outcome.state.is_success() {
                tracing::info!(
                    "[{}/{}] Success: {} (Elapsed: {:.2}s)",
                    current,
                    total,
                    outcome.url,
                    page_elapsed.as_secs_f64()
                );
            }

            if let Some(event) = state.record(index) {
                if let Some(sender) = &progress {
                    // A dropped receiver only means nobody is watching
                    let _ = sender.send(event);
                }
            }

            tracing::info!(
                "Progress: {}/{} links processed. Total elapsed: {:.2}s",
                current,
                total,
                state.elapsed().as_secs_f64()
            );
        }

        let file_list = builder.finish();
        self.sink.append(&file_name, file_list.as_bytes()).await?;
        let download_url = self.sink.finish(&file_name).await?;

        let elapsed = state.elapsed();
        tracing::info!(
            "Finished full content generation. Processed {}/{} links in {:.2}s.",
            state.processed(),
            total,
            elapsed.as_secs_f64()
        );

        Ok(AggregateResult {
            document: builder.into_document(),
            total,
            processed: state.processed(),
            succeeded: state.succeeded(),
            outcomes: state.into_outcomes(),
            cancelled,
            elapsed_ms: elapsed.as_millis() as u64,
            file_name,
            download_url,
        })
    }

    /// Fetches and extracts one page, leaving `outcome` in `Extracted` or a
    /// failure state
    async fn process_page(&self, outcome: &mut PageOutcome) -> Option<ExtractedContent> {
        outcome.advance(PageState::Fetching);

        let page = match fetch_page(&self.client, &outcome.url, &self.retry).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to fetch: {} ({})", outcome.url, e);
                outcome.fail(PageState::FetchFailed, e.to_string());
                return None;
            }
        };
        outcome.advance(PageState::Fetched);

        outcome.advance(PageState::Extracting);
        let extracted = self.extractor.extract(&page.body);

        if extracted.is_empty() {
            tracing::warn!("Extraction failed: {}", outcome.url);
            outcome.fail(
                PageState::ExtractFailed,
                LlmsError::Parse {
                    url: outcome.url.clone(),
                }
                .to_string(),
            );
            return None;
        }

        outcome.advance(PageState::Extracted);
        outcome.title = Some(extracted.title.clone());
        Some(extracted)
    }
}

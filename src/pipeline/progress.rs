//! Per-page outcomes, run state and progress events

use crate::state::PageState;
use serde::Serialize;
use std::time::{Duration, Instant};

/// What happened to one selected URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageOutcome {
    pub url: String,

    /// Final state (or `Pending` if the run stopped before reaching it)
    pub state: PageState,

    /// Extracted title, once known
    pub title: Option<String>,

    /// Failure description for `FetchFailed` / `ExtractFailed`
    pub error: Option<String>,

    /// Time spent on this page (milliseconds)
    pub elapsed_ms: u64,
}

impl PageOutcome {
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: PageState::Pending,
            title: None,
            error: None,
            elapsed_ms: 0,
        }
    }

    /// Moves to `next`; the transition must be legal
    pub(crate) fn advance(&mut self, next: PageState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal page transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Moves to a failure state and records why
    pub(crate) fn fail(&mut self, next: PageState, error: impl Into<String>) {
        self.advance(next);
        self.error = Some(error.into());
    }
}

/// Progress notification sent after each URL is processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// 1-based position of the URL just processed
    pub current: usize,

    /// Number of selected URLs
    pub total: usize,

    pub url: String,

    /// Terminal state reached by that URL
    pub state: PageState,
}

/// Bookkeeping owned by a single aggregation run
///
/// Invariant: `succeeded <= processed <= outcomes.len()`.
#[derive(Debug)]
pub struct AggregationState {
    outcomes: Vec<PageOutcome>,
    processed: usize,
    succeeded: usize,
    started: Instant,
}

impl AggregationState {
    /// Every URL starts `Pending`, in submission order
    pub fn new(urls: &[String]) -> Self {
        Self {
            outcomes: urls.iter().map(PageOutcome::pending).collect(),
            processed: 0,
            succeeded: 0,
            started: Instant::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn outcome_mut(&mut self, index: usize) -> Option<&mut PageOutcome> {
        self.outcomes.get_mut(index)
    }

    /// Counts the URL at `index` as processed once it reached a terminal state
    pub fn record(&mut self, index: usize) -> Option<ProgressEvent> {
        let total = self.total();
        let outcome = self.outcomes.get(index)?;
        debug_assert!(outcome.state.is_terminal());

        self.processed += 1;
        if outcome.state.is_success() {
            self.succeeded += 1;
        }
        debug_assert!(self.succeeded <= self.processed && self.processed <= total);

        Some(ProgressEvent {
            current: index + 1,
            total,
            url: outcome.url.clone(),
            state: outcome.state,
        })
    }

    pub fn into_outcomes(self) -> Vec<PageOutcome> {
        self.outcomes
    }
}

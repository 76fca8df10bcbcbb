//! Aggregation pipeline for multi-page documents
//!
//! This module handles:
//! - Per-URL state tracking and progress events
//! - Sequential fetch, extract and append over selected URLs
//! - Assembling the headline, sections and file list

mod aggregator;
mod document;
mod progress;

pub use aggregator::{AggregateResult, Aggregator};
pub use document::{summary_line, DocumentBuilder};
pub use progress::{AggregationState, PageOutcome, ProgressEvent};

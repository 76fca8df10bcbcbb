//! Crawler module for page fetching and link discovery
//!
//! This module contains the network-facing pieces of the pipeline:
//! - Bounded exponential-backoff retry
//! - HTTP fetching with redirect guarding and error classification
//! - Same-origin link discovery on a seed page

mod discover;
mod fetcher;
mod retry;

pub use discover::{discover_links, LinkEntry};
pub use fetcher::{build_http_client, fetch_page, FetchedPage};
pub use retry::{retry, retry_when, RetryPolicy};

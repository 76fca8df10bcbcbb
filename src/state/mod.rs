//! State module for tracking aggregation progress
//!
//! Each URL selected for a multi-page run carries a [`PageState`] through the
//! pipeline; the final state of every URL is reported back to the caller.

mod page_state;

pub use page_state::PageState;

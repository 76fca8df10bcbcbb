/// Page state definitions for tracking aggregation progress
///
/// Every selected URL walks this machine exactly once:
///
/// ```text
/// Pending -> Fetching -> Fetched -> Extracting -> Extracted -> Appended
///                     \-> FetchFailed          \-> ExtractFailed
/// ```
use serde::Serialize;
use std::fmt;

/// Represents the current state of a page in an aggregation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageState {
    // ===== Active States =====
    /// Selected but not yet reached by the pipeline
    Pending,

    /// Request in flight (including retry backoff)
    Fetching,

    /// Body received with a 2xx status
    Fetched,

    /// Running the content extractor
    Extracting,

    /// Extraction produced usable content
    Extracted,

    // ===== Terminal States =====
    /// Section written to the document
    Appended,

    /// Non-2xx response or retries exhausted
    FetchFailed,

    /// Both extraction tiers came back empty
    ExtractFailed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Appended | Self::FetchFailed | Self::ExtractFailed)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Appended)
    }

    /// Whether the machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Fetched)
                | (Self::Fetching, Self::FetchFailed)
                | (Self::Fetched, Self::Extracting)
                | (Self::Extracting, Self::Extracted)
                | (Self::Extracting, Self::ExtractFailed)
                | (Self::Extracted, Self::Appended)
        )
    }

    /// Stable string form, matching the serialized representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Fetching => "FETCHING",
            Self::Fetched => "FETCHED",
            Self::Extracting => "EXTRACTING",
            Self::Extracted => "EXTRACTED",
            Self::Appended => "APPENDED",
            Self::FetchFailed => "FETCH_FAILED",
            Self::ExtractFailed => "EXTRACT_FAILED",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Content extraction: HTML in, `(title, plain text)` out
//!
//! Extraction is an ordered list of strategies. Each one either produces
//! content or reports why it could not; the first success wins. A tier
//! failure is an expected outcome, never an error, and all tiers are pure
//! functions of the HTML.

mod fallback;
mod readability;
mod text;

pub use fallback::{page_title, FallbackStrategy, UNTITLED};
pub use readability::ReadabilityStrategy;
pub use text::collapse_whitespace;

use scraper::Html;
use serde::Serialize;
use std::fmt;

/// Default minimum article length (characters) for the readability tier
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 100;

/// Title and plain-text body of one page
///
/// An empty `content` means extraction failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedContent {
    pub title: String,
    pub content: String,
}

impl ExtractedContent {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Why a tier declined to produce content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierFailure {
    /// Nothing on the page looked like an article
    NoCandidate,

    /// The best candidate was at or below the length threshold
    TooShort { length: usize, minimum: usize },

    /// The tier found no text at all
    Empty,
}

impl fmt::Display for TierFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidate => write!(f, "no article candidate"),
            Self::TooShort { length, minimum } => {
                write!(f, "content too short ({} <= {} chars)", length, minimum)
            }
            Self::Empty => write!(f, "no text found"),
        }
    }
}

/// One extraction tier
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Attempts extraction from a parsed document
    fn extract(&self, document: &Html) -> Result<ExtractedContent, TierFailure>;
}

/// Result of running the tier chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub content: ExtractedContent,

    /// Name of the tier that produced the content, `None` if all declined
    pub tier: Option<&'static str>,
}

/// Runs extraction tiers in order and returns the first success
pub struct Extractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Extractor {
    /// Readability first, then the selector fallback
    ///
    /// # Arguments
    ///
    /// * `min_content_length` - readability results must be longer than this
    pub fn new(min_content_length: usize) -> Self {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(ReadabilityStrategy::new(min_content_length)) as Box<dyn ExtractionStrategy>,
            Box::new(FallbackStrategy),
        ];
        Self::with_strategies(strategies)
    }

    /// Builds an extractor from a custom tier list
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Extracts content; an empty `content` signals that every tier declined
    pub fn extract(&self, html: &str) -> ExtractedContent {
        self.extract_detailed(html).content
    }

    /// Extracts content and reports which tier produced it
    pub fn extract_detailed(&self, html: &str) -> Extraction {
        let document = Html::parse_document(html);

        for strategy in &self.strategies {
            match strategy.extract(&document) {
                Ok(content) => {
                    tracing::debug!(
                        "{} tier extracted {} chars",
                        strategy.name(),
                        content.content.len()
                    );
                    return Extraction {
                        content,
                        tier: Some(strategy.name()),
                    };
                }
                Err(reason) => {
                    tracing::debug!("{} tier declined: {}", strategy.name(), reason);
                }
            }
        }

        Extraction {
            content: ExtractedContent {
                title: page_title(&document),
                content: String::new(),
            },
            tier: None,
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONTENT_LENGTH)
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("Extractor").field("strategies", &names).finish()
    }
}

/// Extracts content with the default tiers and threshold
///
/// # Example
///
/// ```
/// use llmstxt::extract_content;
///
/// let html = "<html><head><title>Note</title></head><body><main>Short note.</main></body></html>";
/// let extracted = extract_content(html);
/// assert_eq!(extracted.title, "Note");
/// assert_eq!(extracted.content, "Short note.");
/// ```
pub fn extract_content(html: &str) -> ExtractedContent {
    Extractor::default().extract(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_TEXT: &str = "The aggregation pipeline walks every selected page in order, \
        fetches it with a bounded retry budget, extracts the readable text, and appends one \
        section per page to the output document.";

    #[test]
    fn test_readability_tier_wins_for_article_pages() {
        let html = format!(
            r#"<html><head><title>Pipeline</title></head><body>
                <nav><a href="/">Home</a><a href="/docs">Docs</a></nav>
                <article><p>{}</p></article>
                <footer>Footer links and legal text</footer>
            </body></html>"#,
            ARTICLE_TEXT
        );

        let extraction = Extractor::default().extract_detailed(&html);

        assert_eq!(extraction.tier, Some("readability"));
        assert_eq!(extraction.content.content, ARTICLE_TEXT);
        assert!(!extraction.content.content.contains("Home"));
        assert!(!extraction.content.content.contains("Footer"));
    }

    #[test]
    fn test_short_page_uses_fallback_selectors() {
        let html = r#"<html><head><title>Tiny</title></head><body>
            <nav>Menu</nav>
            <main><p>Just a few words here.</p></main>
        </body></html>"#;

        let extraction = Extractor::default().extract_detailed(html);

        assert_eq!(extraction.tier, Some("fallback"));
        assert_eq!(extraction.content.title, "Tiny");
        assert_eq!(extraction.content.content, "Just a few words here.");
    }

    #[test]
    fn test_empty_page_yields_empty_content() {
        let extraction =
            Extractor::default().extract_detailed("<html><head></head><body></body></html>");

        assert_eq!(extraction.tier, None);
        assert!(extraction.content.is_empty());
        assert_eq!(extraction.content.title, UNTITLED);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let html = "<html><body><p>A paragraph that is comfortably longer than twenty five characters.</p></body></html>";

        let strict = Extractor::new(100).extract_detailed(html);
        let lenient = Extractor::new(10).extract_detailed(html);

        assert_eq!(strict.tier, Some("fallback"));
        assert_eq!(lenient.tier, Some("readability"));
    }

    #[test]
    fn test_form_wrapped_page_uses_readability() {
        let html = format!(
            r#"<html><head><title>Story</title></head><body><form id="aspnetForm">
                <div class="sidebar-block">Popular posts this week you might also enjoy reading today</div>
                <div id="story"><p>{}</p></div>
            </form></body></html>"#,
            ARTICLE_TEXT
        );

        let extraction = Extractor::default().extract_detailed(&html);

        assert_eq!(extraction.tier, Some("readability"));
        assert_eq!(extraction.content.content, ARTICLE_TEXT);
        assert!(!extraction.content.content.contains("Popular posts"));
    }

    #[test]
    fn test_never_panics_on_garbage() {
        let extraction = Extractor::default().extract_detailed("<<<>>> </div></p> &&& <");
        assert!(extraction.tier.is_none() || !extraction.content.is_empty());
    }
}

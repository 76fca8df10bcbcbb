//! Selector-based fallback extraction
//!
//! Used when the readability tier finds no article. Boilerplate is skipped,
//! the title comes from the first available metadata source, and the body
//! comes from the first "main content" container that has any text.

use crate::extract::text::{collapse_whitespace, text_without};
use crate::extract::{ExtractedContent, ExtractionStrategy, TierFailure};
use scraper::node::Element;
use scraper::{Html, Selector};

/// Title used when a page carries none
pub const UNTITLED: &str = "Untitled";

/// Main content containers, most specific first
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[role=main]",
    "main",
    ".article-content",
    ".post-content",
    ".entry-content",
    "#content",
    ".content",
    ".post",
    ".article-body",
];

const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "iframe", "aside", "template",
];

const AD_CLASSES: &[&str] = &["ads", "ad", "advertisement", "ad-container", "sponsored"];

/// Second extraction tier
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackStrategy;

impl ExtractionStrategy for FallbackStrategy {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn extract(&self, document: &Html) -> Result<ExtractedContent, TierFailure> {
        let content = main_content(document).unwrap_or_default();

        if content.is_empty() {
            return Err(TierFailure::Empty);
        }

        Ok(ExtractedContent {
            title: page_title(document),
            content,
        })
    }
}

/// Resolves a page title
///
/// # Order
///
/// 1. `<title>`
/// 2. `<meta property="og:title">`
/// 3. `<meta name="twitter:title">`
/// 4. First `<h1>`
/// 5. `"Untitled"`
pub fn page_title(document: &Html) -> String {
    let sources: [(&str, Option<&str>); 4] = [
        ("title", None),
        ("meta[property='og:title']", Some("content")),
        ("meta[name='twitter:title']", Some("content")),
        ("h1", None),
    ];

    for (css, attribute) in sources {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let Some(element) = document.select(&selector).next() else {
            continue;
        };

        let raw = match attribute {
            Some(name) => element.value().attr(name).unwrap_or("").to_string(),
            None => element.text().collect::<String>(),
        };

        let title = collapse_whitespace(&raw);
        if !title.is_empty() {
            return title;
        }
    }

    UNTITLED.to_string()
}

/// Text of the first non-empty content container, else of `<body>`
fn main_content(document: &Html) -> Option<String> {
    for css in CONTENT_SELECTORS.iter().chain(std::iter::once(&"body")) {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };

        if let Some(element) = document.select(&selector).next() {
            let text = text_without(element, &is_fallback_noise);
            if !text.is_empty() {
                tracing::trace!("Fallback content matched '{}'", css);
                return Some(text);
            }
        }
    }

    None
}

fn is_fallback_noise(element: &Element) -> bool {
    if NOISE_TAGS.contains(&element.name()) {
        return true;
    }

    if let Some(role) = element.attr("role") {
        let role = role.trim().to_ascii_lowercase();
        if role == "banner" || role == "navigation" {
            return true;
        }
    }

    if element.id() == Some("ads") {
        return true;
    }

    element.classes().any(|class| AD_CLASSES.contains(&class))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Result<ExtractedContent, TierFailure> {
        FallbackStrategy.extract(&Html::parse_document(html))
    }

    #[test]
    fn test_prefers_article_over_body() {
        let result = run(
            r#"<html><head><title>Page</title></head><body>
               <nav>Home About</nav>
               <article>Main   story text.</article>
               <footer>Copyright</footer>
            </body></html>"#,
        )
        .unwrap();

        assert_eq!(result.title, "Page");
        assert_eq!(result.content, "Main story text.");
    }

    #[test]
    fn test_body_when_no_container() {
        let result = run(
            r#"<html><body><header>Site</header><div>Just a short note.</div><script>x()</script></body></html>"#,
        )
        .unwrap();

        assert_eq!(result.content, "Just a short note.");
        assert_eq!(result.title, UNTITLED);
    }

    #[test]
    fn test_ads_and_roles_removed() {
        let result = run(
            r#"<body><main>
                 <div class="ads">Buy now</div>
                 <div id="ads">Buy later</div>
                 <div role="banner">Banner</div>
                 <p>Real content</p>
               </main></body>"#,
        )
        .unwrap();

        assert_eq!(result.content, "Real content");
    }

    #[test]
    fn test_empty_container_falls_through() {
        let result = run(r#"<body><article><nav>Only nav</nav></article><div class="content">Text</div></body>"#)
            .unwrap();

        assert_eq!(result.content, "Text");
    }

    #[test]
    fn test_title_chain() {
        let doc = Html::parse_document(
            r#"<head><meta property="og:title" content="From OG"></head><body><h1>Heading</h1></body>"#,
        );
        assert_eq!(page_title(&doc), "From OG");

        let doc = Html::parse_document("<body><h1> Only  Heading </h1></body>");
        assert_eq!(page_title(&doc), "Only Heading");
    }

    #[test]
    fn test_empty_page_is_tier_failure() {
        assert_eq!(run("<html><body>   </body></html>"), Err(TierFailure::Empty));
    }
}

//! Same-origin link discovery
//!
//! Enumerates the anchors of a fetched seed page and keeps the ones that
//! stay on the seed's origin, in document order, with the seed itself first.

use crate::url::same_origin;
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

/// One selectable page found during discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkEntry {
    /// Absolute URL, unique within one discovery run
    pub url: String,

    /// Display title (anchor text, page title, or the URL itself)
    pub title: String,
}

/// Discovers same-origin links on a seed page
///
/// # Link Rules
///
/// - Every `<a href>` is resolved against `seed` with standard URL
///   resolution (scheme-relative, path-relative, fragment-only).
/// - Hrefs that fail to resolve are skipped.
/// - Resolved URLs on another origin (scheme, host, port) are dropped.
/// - Duplicates collapse by exact URL string; the first occurrence wins and
///   its trimmed anchor text becomes the title, or the URL if that is empty.
/// - The seed is always entry zero, titled by its `<title>` or its own URL.
///   An anchor pointing back at the seed does not produce a second entry.
///
/// # Example
///
/// ```
/// use llmstxt::crawler::discover_links;
/// use url::Url;
///
/// let seed = Url::parse("https://example.com/").unwrap();
/// let html = r#"<title>Home</title><a href="/docs">Docs</a><a href="https://other.org/">Out</a>"#;
/// let links = discover_links(&seed, html);
///
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[0].title, "Home");
/// assert_eq!(links[1].url, "https://example.com/docs");
/// ```
pub fn discover_links(seed: &Url, html: &str) -> Vec<LinkEntry> {
    let document = Html::parse_document(html);

    let seed_url = seed.to_string();
    let seed_title = page_title(&document).unwrap_or_else(|| seed_url.clone());

    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(seed_url.clone());

    let mut links = vec![LinkEntry {
        url: seed_url,
        title: seed_title,
    }];

    let anchor_selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return links,
    };

    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        let resolved = match seed.join(href.trim()) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping malformed href '{}': {}", href, e);
                continue;
            }
        };

        if !same_origin(seed, &resolved) {
            continue;
        }

        let url = resolved.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }

        let text = collapse_text(anchor.text());
        let title = if text.is_empty() { url.clone() } else { text };

        links.push(LinkEntry { url, title });
    }

    tracing::debug!("Discovered {} links on {}", links.len(), seed);
    links
}

/// Returns the trimmed `<title>` text, if present and non-empty
fn page_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| collapse_text(element.text()))
        .filter(|title| !title.is_empty())
}

fn collapse_text<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    pieces
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

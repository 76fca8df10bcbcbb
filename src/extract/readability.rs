//! Reader-mode article extraction
//!
//! A compact take on the reader-view heuristic: paragraphs vote for their
//! ancestors by text density, ancestors are weighted by tag and class/id
//! hints, link-heavy blocks are penalized, and the best block plus any
//! strong siblings becomes the article.

use crate::extract::fallback;
use crate::extract::text::{content_text, is_noise, link_text_len};
use crate::extract::{ExtractedContent, ExtractionStrategy, TierFailure};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// Paragraph-like elements that cast votes
const SCORED_TAGS: &[&str] = &["p", "pre", "td", "section", "h2", "h3", "h4", "h5", "h6"];

/// A `<div>` containing any of these is a container, not a paragraph
const DIV_BLOCK_CHILDREN: &[&str] = &[
    "blockquote", "dl", "div", "img", "ol", "p", "pre", "table", "ul",
];

/// Class/id fragments that mark a subtree as page chrome
const UNLIKELY_HINTS: &[&str] = &[
    "banner", "breadcrumbs", "combx", "comment", "community", "cover-wrap", "disqus", "extra",
    "footer", "gdpr", "header", "legends", "menu", "related", "remark", "replies", "rss",
    "shoutbox", "sidebar", "skyscraper", "social", "sponsor", "supplemental", "ad-break",
    "agegate", "pagination", "pager", "popup", "yom-remote",
];

/// Class/id fragments that rescue an otherwise unlikely subtree
const MAYBE_HINTS: &[&str] = &["and", "article", "body", "column", "content", "main", "shadow"];

const POSITIVE_HINTS: &[&str] = &[
    "article", "body", "content", "entry", "hentry", "h-entry", "main", "page", "post", "text",
    "blog", "story",
];

const NEGATIVE_HINTS: &[&str] = &[
    "-ad-", "hidden", "banner", "combx", "comment", "com-", "contact", "footer", "gdpr",
    "masthead", "media", "meta", "outbrain", "promo", "related", "scroll", "share", "shoutbox",
    "sidebar", "skyscraper", "sponsor", "shopping", "tags", "widget",
];

/// Title separators; the segment after the last one is usually the site name
const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " – ", " — ", " :: ", " / ", " » "];

/// Shortest paragraph (in characters) allowed to vote
const MIN_PARAGRAPH_LEN: usize = 25;

/// Ancestors that receive a share of each paragraph's score
const MAX_ANCESTOR_DEPTH: usize = 5;

/// First extraction tier
#[derive(Debug, Clone, Copy)]
pub struct ReadabilityStrategy {
    min_content_length: usize,
}

impl ReadabilityStrategy {
    /// Creates the tier; results must have more than `min_content_length` characters
    pub fn new(min_content_length: usize) -> Self {
        Self { min_content_length }
    }
}

impl ExtractionStrategy for ReadabilityStrategy {
    fn name(&self) -> &'static str {
        "readability"
    }

    fn extract(&self, document: &Html) -> Result<ExtractedContent, TierFailure> {
        let body = select_first(document, "body").ok_or(TierFailure::NoCandidate)?;

        let scores = score_candidates(body);
        let top = scores.best().ok_or(TierFailure::NoCandidate)?;
        let top = climb_single_child_parents(top);

        let content = article_text(top, &scores);
        let length = content.chars().count();

        if length <= self.min_content_length {
            return Err(TierFailure::TooShort {
                length,
                minimum: self.min_content_length,
            });
        }

        let title = article_title(document).unwrap_or_else(|| fallback::page_title(document));

        Ok(ExtractedContent { title, content })
    }
}

/// Candidate scores in first-scored order
struct Scores<'a> {
    order: Vec<ElementRef<'a>>,
    values: HashMap<NodeId, f64>,
}

impl<'a> Scores<'a> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            values: HashMap::new(),
        }
    }

    fn add(&mut self, element: ElementRef<'a>, amount: f64) {
        let id = element.id();
        if !self.values.contains_key(&id) {
            self.order.push(element);
            self.values.insert(id, initial_score(element));
        }
        if let Some(score) = self.values.get_mut(&id) {
            *score += amount;
        }
    }

    fn get(&self, element: ElementRef<'a>) -> Option<f64> {
        self.values.get(&element.id()).copied()
    }

    /// Link-density-adjusted score
    fn adjusted(&self, element: ElementRef<'a>) -> Option<f64> {
        self.get(element)
            .map(|score| score * (1.0 - link_density(element)))
    }

    /// Highest adjusted score; ties go to the earlier candidate
    fn best(&self) -> Option<ElementRef<'a>> {
        let mut best: Option<(ElementRef<'a>, f64)> = None;
        for &candidate in &self.order {
            let Some(score) = self.adjusted(candidate) else {
                continue;
            };
            match best {
                Some((_, top)) if top >= score => {}
                _ => best = Some((candidate, score)),
            }
        }
        best.map(|(element, _)| element)
    }
}

/// Walks the body, letting every paragraph-like block vote for its ancestors
fn score_candidates(body: ElementRef<'_>) -> Scores<'_> {
    let mut scores = Scores::new();
    let mut paragraphs = Vec::new();
    collect_paragraphs(body, &mut paragraphs);

    for paragraph in paragraphs {
        let text = content_text(paragraph);
        let length = text.chars().count();
        if length < MIN_PARAGRAPH_LEN {
            continue;
        }

        let commas = text.matches(',').count() as f64;
        let score = 1.0 + commas + (length as f64 / 100.0).floor().min(3.0);

        let ancestors = paragraph
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take(MAX_ANCESTOR_DEPTH);

        for (level, ancestor) in ancestors.enumerate() {
            let divider = match level {
                0 => 1.0,
                1 => 2.0,
                n => n as f64 * 3.0,
            };
            scores.add(ancestor, score / divider);
        }
    }

    scores
}

/// Depth-first collection of voting elements, pruning boilerplate subtrees
fn collect_paragraphs<'a>(element: ElementRef<'a>, out: &mut Vec<ElementRef<'a>>) {
    for child in element.children().filter_map(ElementRef::wrap) {
        if is_noise(child.value()) || is_unlikely(child) {
            continue;
        }

        let name = child.value().name();
        if SCORED_TAGS.contains(&name) || (name == "div" && !has_block_descendant(child)) {
            out.push(child);
        }

        collect_paragraphs(child, out);
    }
}

fn has_block_descendant(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|el| DIV_BLOCK_CHILDREN.contains(&el.value().name()))
}

/// Lower-cased `class` and `id` joined for hint matching
fn class_and_id(element: ElementRef<'_>) -> String {
    let el = element.value();
    format!(
        "{} {}",
        el.attr("class").unwrap_or(""),
        el.attr("id").unwrap_or("")
    )
    .to_ascii_lowercase()
}

fn is_unlikely(element: ElementRef<'_>) -> bool {
    let name = element.value().name();
    if name == "body" || name == "a" || name == "article" || name == "main" {
        return false;
    }

    let hints = class_and_id(element);
    UNLIKELY_HINTS.iter().any(|hint| hints.contains(hint))
        && !MAYBE_HINTS.iter().any(|hint| hints.contains(hint))
}

/// ±25 from class/id hints
fn class_weight(element: ElementRef<'_>) -> f64 {
    let hints = class_and_id(element);
    let mut weight = 0.0;

    if NEGATIVE_HINTS.iter().any(|hint| hints.contains(hint)) {
        weight -= 25.0;
    }
    if POSITIVE_HINTS.iter().any(|hint| hints.contains(hint)) {
        weight += 25.0;
    }

    weight
}

/// Starting score of a freshly seen candidate, from its tag and hints
fn initial_score(element: ElementRef<'_>) -> f64 {
    let tag_weight = match element.value().name() {
        "div" | "article" | "main" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };
    tag_weight + class_weight(element)
}

/// Share of an element's text that sits inside links (0.0 to 1.0)
fn link_density(element: ElementRef<'_>) -> f64 {
    let total = content_text(element).chars().count();
    if total == 0 {
        return 0.0;
    }
    (link_text_len(element) as f64 / total as f64).min(1.0)
}

/// While the candidate is the only element child of its parent, use the parent
fn climb_single_child_parents(mut candidate: ElementRef<'_>) -> ElementRef<'_> {
    while let Some(parent) = candidate.parent().and_then(ElementRef::wrap) {
        if matches!(parent.value().name(), "body" | "html") {
            break;
        }
        if parent.children().filter_map(ElementRef::wrap).count() != 1 {
            break;
        }
        candidate = parent;
    }
    candidate
}

/// Text of the top candidate plus siblings that look like part of the article
fn article_text<'a>(top: ElementRef<'a>, scores: &Scores<'a>) -> String {
    let Some(parent) = top.parent().and_then(ElementRef::wrap) else {
        return content_text(top);
    };

    let top_score = scores.adjusted(top).unwrap_or(0.0);
    let threshold = (top_score * 0.2).max(10.0);

    let mut parts = Vec::new();
    for sibling in parent.children().filter_map(ElementRef::wrap) {
        if is_noise(sibling.value()) {
            continue;
        }

        let include = sibling.id() == top.id()
            || scores
                .adjusted(sibling)
                .map(|score| score >= threshold)
                .unwrap_or(false)
            || is_paragraph_like_sibling(sibling);

        if include {
            let text = content_text(sibling);
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }

    parts.join(" ")
}

/// A stand-alone `<p>` next to the article that reads like prose
fn is_paragraph_like_sibling(element: ElementRef<'_>) -> bool {
    if element.value().name() != "p" {
        return false;
    }

    let text = content_text(element);
    let length = text.chars().count();
    let density = link_density(element);

    if length > 80 {
        density < 0.25
    } else {
        length > 0 && density == 0.0 && (text.ends_with('.') || text.contains(". "))
    }
}

/// `<title>` with a trailing site-name segment removed
///
/// The segment after the last separator is dropped only when at least three
/// words remain; otherwise the full title is kept.
fn article_title(document: &Html) -> Option<String> {
    let raw = select_first(document, "title")
        .map(|el| el.text().collect::<String>())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())?;

    let cut = TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| raw.rfind(sep))
        .max();

    if let Some(index) = cut {
        let head = raw[..index].trim();
        if head.split_whitespace().count() >= 3 {
            return Some(head.to_string());
        }
    }

    Some(raw)
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = "Rust gives you control over memory layout without a garbage collector, \
        and its ownership rules catch data races at compile time. Teams adopt it for services, \
        command-line tools, and embedded firmware alike.";

    fn run(html: &str) -> Result<ExtractedContent, TierFailure> {
        ReadabilityStrategy::new(100).extract(&Html::parse_document(html))
    }

    #[test]
    fn test_article_between_nav_and_footer() {
        let html = format!(
            r#"<html><head><title>Why Rust</title></head><body>
                <nav><a href="/">Home</a> <a href="/blog">Blog</a> <a href="/about">About us and the team</a></nav>
                <article><p>{}</p></article>
                <footer>Copyright 2024 Example Corp. All rights reserved, forever and ever.</footer>
            </body></html>"#,
            ARTICLE
        );

        let result = run(&html).unwrap();
        assert_eq!(result.title, "Why Rust");
        assert_eq!(result.content, ARTICLE);
    }

    #[test]
    fn test_short_page_is_too_short() {
        let result = run("<html><body><p>A tiny page with a single short sentence.</p></body></html>");
        assert!(matches!(
            result,
            Err(TierFailure::TooShort { minimum: 100, .. })
        ));
    }

    #[test]
    fn test_no_paragraphs_is_no_candidate() {
        let result = run("<html><body><span>hi</span></body></html>");
        assert_eq!(result, Err(TierFailure::NoCandidate));
    }

    #[test]
    fn test_sidebar_is_pruned() {
        let html = format!(
            r#"<body>
                <div class="sidebar"><p>{}</p></div>
                <div class="post"><p>{}</p><p>{}</p></div>
            </body>"#,
            "Sidebar text that is long enough to be scored, with commas, commas, commas.",
            ARTICLE,
            ARTICLE
        );

        let result = run(&html).unwrap();
        assert!(!result.content.contains("Sidebar"));
        assert!(result.content.starts_with("Rust gives you control"));
    }

    #[test]
    fn test_link_heavy_block_loses() {
        let links: String = (0..10)
            .map(|i| format!(r#"<a href="/p{i}">Another related article number {i}, read it</a> "#))
            .collect();
        let html = format!(
            r#"<body><div id="links"><p>{}</p></div><div id="story"><p>{}</p></div></body>"#,
            links, ARTICLE
        );

        let result = run(&html).unwrap();
        assert_eq!(result.content, ARTICLE);
    }

    #[test]
    fn test_page_wrapped_in_form() {
        let html = format!(
            r#"<html><body><form id="aspnetForm">
                <div class="sidebar-block">Popular posts this week you might also enjoy reading today</div>
                <div id="story"><p>{}</p></div>
            </form></body></html>"#,
            ARTICLE
        );

        let result = run(&html).unwrap();
        assert_eq!(result.content, ARTICLE);
        assert_eq!(result.title, fallback::UNTITLED);
    }

    #[test]
    fn test_title_site_suffix_removed() {
        let doc = Html::parse_document("<title>How the borrow checker works | Example Blog</title>");
        assert_eq!(
            article_title(&doc).as_deref(),
            Some("How the borrow checker works")
        );

        let doc = Html::parse_document("<title>Docs | Example</title>");
        assert_eq!(article_title(&doc).as_deref(), Some("Docs | Example"));
    }
}

//! Text helpers shared by the extraction tiers

use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{ElementRef, Node};

/// Elements whose text never counts as page content
///
/// Not `form`: some pages wrap all of their content in one.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "aside", "iframe", "svg", "button",
    "template",
];

/// ARIA roles marking page chrome rather than content
const NOISE_ROLES: &[&str] = &["banner", "navigation", "complementary", "contentinfo"];

/// Elements that start a new line of text when rendered
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section", "table",
    "td", "th", "tr", "ul",
];

/// Collapses every whitespace run to a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true for boilerplate elements (by tag or ARIA role)
pub fn is_noise(element: &Element) -> bool {
    if NOISE_TAGS.contains(&element.name()) {
        return true;
    }
    element
        .attr("role")
        .map(|role| NOISE_ROLES.contains(&role.trim().to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn is_block(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

/// Visible text of `element` with boilerplate subtrees skipped
///
/// Block boundaries become spaces so adjacent paragraphs do not run
/// together; the result is whitespace-collapsed.
pub fn content_text(element: ElementRef<'_>) -> String {
    text_without(element, &is_noise)
}

/// Visible text of `element`, skipping subtrees for which `skip` holds
pub fn text_without<F>(element: ElementRef<'_>, skip: &F) -> String
where
    F: Fn(&Element) -> bool,
{
    let mut raw = String::new();
    push_text(*element, &mut raw, skip);
    collapse_whitespace(&raw)
}

fn push_text<F>(node: NodeRef<'_, Node>, out: &mut String, skip: &F)
where
    F: Fn(&Element) -> bool,
{
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(element) => {
                if skip(element) {
                    continue;
                }
                let block = is_block(element.name());
                if block {
                    out.push(' ');
                }
                push_text(child, out, skip);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Character length of the text inside `<a>` descendants
pub fn link_text_len(element: ElementRef<'_>) -> usize {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "a")
        .map(|anchor| content_text(anchor).chars().count())
        .sum()
}

//! Prompt template and single-page document framing

use chrono::{DateTime, SecondsFormat, Utc};

const INSTRUCTIONS: &str = r#"You are an expert webpage content formatter for creating high-quality Markdown suitable for training or providing context to large language models (LLMs). Your task is to convert input webpage content into clean, well-structured Markdown, paying meticulous attention to preserving semantic meaning and important formatting cues using Markdown syntax. Specifically:

* Maintain code blocks exactly as they appear in the source, using Markdown fenced code blocks (```). Clearly identify the language if specified after the opening ```.

* Structure the content logically using Markdown headings (#, ##, ###, etc), Markdown lists (*, -, or + for unordered; 1., 2. for ordered), and Markdown blockquotes (>).

* Preserve emphasis (important information or distinct elements) using Markdown bold (**text** or __text__) and italics (*text* or _text_) syntax.

* Convert HTML links into Markdown links ([link text](href_url)). Relative URLs stay relative; do not add placeholders for them.

* Convert HTML `<img>` tags to Markdown image syntax (`![alt text](image_url)`). Relative URLs stay relative; do not add placeholders for them.

* Convert HTML `<table>` elements to Markdown tables. Strive for readability. If complex table structures are encountered, prioritize preserving the data accurately, even if the visual formatting isn't perfectly replicated in Markdown.

* Ensure clear separation between paragraphs (using blank lines) and sections for optimal readability by AI agents.

* Favor semantic Markdown structure over replicating visual presentation. Use appropriate Markdown elements to convey meaning.

* Output should be a single, cohesive Markdown document.

* Do not add any other text or comments.

Here is the webpage content: "#;

/// Wraps extracted page text in the fixed formatting instructions
pub fn build_prompt(content: &str) -> String {
    format!("{}{}\n", INSTRUCTIONS, content)
}

/// Front matter block that opens a single-page document
///
/// ```text
/// ---
/// title: {title}
/// url: {url}
/// timestamp: {RFC 3339, millisecond precision, UTC}
/// ---
/// ```
pub fn front_matter(title: &str, url: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "---\ntitle: {}\nurl: {}\ntimestamp: {}\n---\n",
        title,
        url,
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Front matter followed by the formatted Markdown body
pub fn format_document(title: &str, url: &str, timestamp: DateTime<Utc>, markdown: &str) -> String {
    let mut document = front_matter(title, url, timestamp);
    document.push_str(markdown);
    document
}

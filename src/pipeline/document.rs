//! Incremental assembly of the multi-page document
//!
//! Every method returns the exact text it appended so the caller can mirror
//! it to an export sink; the full document is also kept in memory.

/// Builds `headline + summary + sections + file list`
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: String,
    manifest: Vec<String>,
    has_headline: bool,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one page section
    ///
    /// The first page also contributes the document headline and summary:
    /// `# {title}` and `> {content up to the first ". "}`.
    pub fn add_page(&mut self, title: &str, url: &str, content: &str) -> String {
        let mut chunk = String::new();

        if !self.has_headline {
            chunk.push_str(&format!("# {}\n", title));
            chunk.push_str(&format!("> {}\n", summary_line(content)));
            self.has_headline = true;
        }

        chunk.push_str(&format!("\n\n# {}\n\n{}\n", title, content));
        self.manifest.push(format!("- [{}]({})", title, url));

        self.document.push_str(&chunk);
        chunk
    }

    /// Appends the trailing `## File List` section built from the manifest
    pub fn finish(&mut self) -> String {
        let chunk = format!("\n\n## File List\n{}", self.manifest.join("\n"));
        self.document.push_str(&chunk);
        chunk
    }

    /// Manifest lines, in processing order
    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    pub fn into_document(self) -> String {
        self.document
    }
}

/// Text up to the first literal `". "`, or all of it if there is none
pub fn summary_line(content: &str) -> &str {
    content.split(". ").next().unwrap_or(content)
}

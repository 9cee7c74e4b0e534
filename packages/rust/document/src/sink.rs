//! Document sink — where sections, entries, and the TOC region land.
//!
//! The core decides *when* to append or rebuild; the sink just applies
//! the calls. [`MarkdownDocument`] is the provided implementation: one
//! Markdown file with anchored section headings and a TOC region between
//! markers, plus a line-count page estimate serving as the layout oracle.

use std::path::Path;

use tracing::{debug, info};

use ementario_shared::{EmentarioError, Entry, Result, TocLine};

use crate::oracle::LayoutOracle;

/// Start marker of the managed TOC region.
const TOC_START: &str = "<!-- sumario:inicio -->";
/// End marker of the managed TOC region.
const TOC_END: &str = "<!-- sumario:fim -->";

/// Receiver for assembled document content.
pub trait DocumentSink {
    /// Append a new section heading anchored at `bookmark_name`.
    fn append_section(&mut self, title: &str, bookmark_name: &str) -> Result<()>;

    /// Append one normalized entry to the current section.
    fn append_entry(&mut self, entry: &Entry) -> Result<()>;

    /// Discard everything inside the TOC region and write `lines` in its
    /// place.
    fn replace_toc_region(&mut self, lines: &[TocLine]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MarkdownDocument
// ---------------------------------------------------------------------------

/// In-memory Markdown document with a managed TOC region.
#[derive(Debug)]
pub struct MarkdownDocument {
    lines: Vec<String>,
    /// Lines per page assumed by the page estimate.
    lines_per_page: u32,
}

impl MarkdownDocument {
    /// Create a document with a title heading and an empty TOC region.
    pub fn new(title: &str, lines_per_page: u32) -> Self {
        let lines = vec![
            format!("# {title}"),
            String::new(),
            "## Sumário".to_string(),
            String::new(),
            TOC_START.to_string(),
            TOC_END.to_string(),
            String::new(),
        ];
        Self {
            lines,
            lines_per_page: lines_per_page.max(1),
        }
    }

    /// Render the current document content.
    pub fn content(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Write the document to disk, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EmentarioError::io(parent, e))?;
        }
        std::fs::write(path, self.content()).map_err(|e| EmentarioError::io(path, e))?;
        info!(path = %path.display(), lines = self.lines.len(), "document saved");
        Ok(())
    }

    fn anchor_line(bookmark_name: &str) -> String {
        format!("<a id=\"{bookmark_name}\"></a>")
    }

    /// Indexes of the TOC region markers.
    fn toc_region(&self) -> Result<(usize, usize)> {
        let start = self
            .lines
            .iter()
            .position(|l| l == TOC_START)
            .ok_or_else(|| EmentarioError::parse("TOC start marker missing from document"))?;
        let end = self
            .lines
            .iter()
            .position(|l| l == TOC_END)
            .ok_or_else(|| EmentarioError::parse("TOC end marker missing from document"))?;
        if end < start {
            return Err(EmentarioError::parse("TOC markers out of order"));
        }
        Ok((start, end))
    }
}

impl DocumentSink for MarkdownDocument {
    fn append_section(&mut self, title: &str, bookmark_name: &str) -> Result<()> {
        self.lines.push(Self::anchor_line(bookmark_name));
        self.lines.push(format!("## {title}"));
        self.lines.push(String::new());
        debug!(%title, %bookmark_name, "section appended");
        Ok(())
    }

    fn append_entry(&mut self, entry: &Entry) -> Result<()> {
        if let Some(first) = entry.header_lines.first() {
            self.lines.push(format!("**{}**", first.trim()));
        }
        self.lines.push(format!(
            "- Processo: {}",
            entry.process_key.as_deref().unwrap_or("não identificado")
        ));
        if !entry.org_text.is_empty() {
            self.lines.push(format!("- Órgão Judicante: {}", entry.org_text));
        }
        if !entry.relator.is_empty() {
            self.lines.push(format!("- Relator: {}", entry.relator));
        }
        if !entry.publication_label.is_empty() {
            self.lines.push(format!("- Publicação: {}", entry.publication_label));
        }
        if !entry.document_type.is_empty() {
            self.lines.push(format!("- Tipo de Documento: {}", entry.document_type));
        }
        self.lines.push(String::new());
        if !entry.body.is_empty() {
            self.lines.push(entry.body.clone());
            self.lines.push(String::new());
        }
        self.lines.push("---".to_string());
        self.lines.push(String::new());
        Ok(())
    }

    fn replace_toc_region(&mut self, lines: &[TocLine]) -> Result<()> {
        let (start, end) = self.toc_region()?;

        let rendered: Vec<String> = lines
            .iter()
            .map(|line| match line.page {
                Some(page) => format!("- [{}](#{}) — p. {page}", line.label, line.bookmark_name),
                None => format!("- [{}](#{})", line.label, line.bookmark_name),
            })
            .collect();

        // Everything between the markers is discarded, never edited.
        self.lines.splice(start + 1..end, rendered);
        Ok(())
    }
}

impl LayoutOracle for MarkdownDocument {
    /// Estimate the page a bookmark falls on from its line position.
    ///
    /// Coarse by design: the estimate shifts as content (including the
    /// TOC region itself) grows, which is why the TOC is reconciled
    /// again at the end of the run.
    fn resolve_page(&self, bookmark_name: &str) -> Option<u32> {
        let anchor = Self::anchor_line(bookmark_name);
        self.lines
            .iter()
            .position(|l| l == &anchor)
            .map(|idx| idx as u32 / self.lines_per_page + 1)
    }
}

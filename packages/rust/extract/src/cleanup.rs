//! Cleanup pipeline for raw ementa bodies.
//!
//! The copy mechanism hands back a raw text blob: header fragments,
//! portal boilerplate, sometimes whole HTML, sometimes truncated edges.
//! Each cleanup pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

/// Run the full cleanup pipeline on a raw body blob.
pub(crate) fn clean_body(raw: &str) -> String {
    let mut result = raw.to_string();

    result = normalize_line_breaks(&result);
    result = strip_html(&result);
    result = strip_acordao_prefix(&result);
    result = strip_inteiro_teor(&result);
    result = strip_truncated_process_fragments(&result);
    result = collapse_hyperlink_markers(&result);
    result = isolate_ementa(&result);
    result = normalize_ellipses(&result);
    result = strip_truncated_edges(&result);
    result = collapse_whitespace(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Normalize line breaks
// ---------------------------------------------------------------------------

fn normalize_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Strip HTML when the blob carries markup
// ---------------------------------------------------------------------------

/// Some copy paths hand back the card's HTML instead of its text.
/// Parse it and keep only the text content, dropping interactive chrome.
fn strip_html(text: &str) -> String {
    if !(text.contains("<div") || text.contains("<section") || text.contains("<button")) {
        return text.to_string();
    }

    let fragment = Html::parse_fragment(text);
    let mut out = String::new();
    collect_text(fragment.root_element(), &mut out);
    out
}

fn collect_text(element: scraper::ElementRef<'_>, out: &mut String) {
    const DROPPED: &[&str] = &["button", "script", "style"];

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(trimmed);
            }
        } else if let Some(child_el) = scraper::ElementRef::wrap(child) {
            if DROPPED.contains(&child_el.value().name()) {
                continue;
            }
            collect_text(child_el, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Pass 3: Leading "Acórdão" label
// ---------------------------------------------------------------------------

fn strip_acordao_prefix(text: &str) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)^\s*Acórdão\s*").expect("valid regex"));
    RE.replace(text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 4: "Inteiro teor" boilerplate
// ---------------------------------------------------------------------------

/// The portal appends "Inteiro teor" fragments in several shapes: with a
/// parenthesized size, trailing free text, or as a "ler inteiro teor"
/// button caption.
fn strip_inteiro_teor(text: &str) -> String {
    static PARENS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)Inteiro teor\s*\([^)]*\)").expect("valid regex"));
    static TAIL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)Inteiro teor[^\n.]*").expect("valid regex"));
    static LER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)\s*ler inteiro teor\s*,?\s*").expect("valid regex"));

    let result = PARENS_RE.replace_all(text, "");
    let result = TAIL_RE.replace_all(&result, "");
    LER_RE.replace_all(&result, " ").to_string()
}

// ---------------------------------------------------------------------------
// Pass 5: Truncated process-number fragments
// ---------------------------------------------------------------------------

/// Listing snippets cut mid-number leave fragments like
/// "...1731-25.2010.5.24.0022 RECURSO" ahead of the body.
fn strip_truncated_process_fragments(text: &str) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\.{3,}\d{4}-\d{2}\.\d{4}\.\d+\.\d{2}\.\d{4}[^\n]*").expect("valid regex")
    });
    RE.replace_all(text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 6: Embedded hyperlink markers
// ---------------------------------------------------------------------------

/// Collapse `[display](url)` markers to their display text. The output
/// document places bodies as plain text; inline link targets are noise.
fn collapse_hyperlink_markers(text: &str) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid regex"));
    RE.replace_all(text, "$1").to_string()
}

// ---------------------------------------------------------------------------
// Pass 7: Isolate the text after an "Ementa:" marker
// ---------------------------------------------------------------------------

/// The blob usually carries header + acórdão text + "Ementa:" + the ementa
/// itself. Keep only what follows the marker; when the marker is absent,
/// keep the whole cleaned body.
fn isolate_ementa(text: &str) -> String {
    static NEWLINE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)Ementa:\s*\n(.+)").expect("valid regex"));
    static INLINE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)Ementa:\s*(.+)").expect("valid regex"));

    if let Some(caps) = NEWLINE_RE.captures(text) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = INLINE_RE.captures(text) {
        return caps[1].trim().to_string();
    }
    text.to_string()
}

// ---------------------------------------------------------------------------
// Pass 8: Ellipsis normalization
// ---------------------------------------------------------------------------

fn normalize_ellipses(text: &str) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{4,}").expect("valid regex"));
    RE.replace_all(text, "...").to_string()
}

// ---------------------------------------------------------------------------
// Pass 9: Truncated words at either edge
// ---------------------------------------------------------------------------

/// Snippet truncation leaves half-words glued to ellipses, e.g. a leading
/// "...uando" or a trailing "porqu...".
fn strip_truncated_edges(text: &str) -> String {
    static LEAD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\.{3,}[a-zà-ü]+\s+").expect("valid regex"));
    static TRAIL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+[a-zà-ü]+\.{3,}$").expect("valid regex"));

    let result = LEAD_RE.replace(text.trim(), "");
    TRAIL_RE.replace(&result, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 10: Whitespace collapse
// ---------------------------------------------------------------------------

fn collapse_whitespace(text: &str) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    RE.replace_all(text, " ").trim().to_string()
}

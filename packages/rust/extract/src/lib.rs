//! Record normalization: raw header lines + raw body blob → [`Entry`].
//!
//! Header fields follow the portal's card layout: the process number sits
//! in the first two lines, the document type in the second, and the
//! relator/publication fields behind fixed marker phrases. The body goes
//! through the [`cleanup`] pass pipeline.

mod cleanup;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use ementario_shared::{EmentarioError, Entry, Result};

/// CNJ-style process number: `NNNNNNN-NN.NNNN.N.NN.NNNN`.
static PROCESS_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{7}-\d{2}\.\d{4}\.\d\.\d{2}\.\d{4}").expect("valid regex"));

/// Forum tag in the first header line, e.g. "TRT3 - ROT 0010203…".
static FORUM_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bTRT\d{1,2}\b").expect("valid regex"));

/// A turma line, e.g. "3ª Turma" or "TRT3 - 1ª Turma".
static TURMA_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d{1,2}ª\s*Turma\b").expect("valid regex"));

static RELATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bRelatoria de\s*").expect("valid regex"));

static PUBLICATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Juntado aos autos em\s*").expect("valid regex"));

/// Build an [`Entry`] from a card's header lines and raw body blob.
///
/// Pure transform: same inputs always yield the same entry. Fails with
/// [`EmentarioError::MalformedRecord`] only when neither a process key nor
/// a usable body can be derived; a missing key alone produces an entry
/// with `process_key: None` (un-deduplicable, but still placed).
pub fn normalize(header_lines: &[String], raw_body: &str) -> Result<Entry> {
    let process_key = header_lines
        .iter()
        .take(2)
        .find_map(|line| PROCESS_KEY_RE.find(line))
        .map(|m| m.as_str().to_string());

    let forum_tag = header_lines
        .first()
        .and_then(|line| FORUM_TAG_RE.find(line))
        .map(|m| m.as_str().to_string());

    let document_type = header_lines
        .get(1)
        .map(|line| line.trim().to_string())
        .unwrap_or_default();

    let relator = find_after_marker(header_lines, &RELATOR_RE);
    let publication_label = find_after_marker(header_lines, &PUBLICATION_RE);

    // Órgão Judicante: the turma line when present, else the bare forum tag.
    let org_text = header_lines
        .iter()
        .map(|line| line.trim())
        .find(|line| TURMA_LINE_RE.is_match(line))
        .map(str::to_string)
        .or(forum_tag)
        .unwrap_or_default();

    let body = cleanup::clean_body(raw_body);

    if process_key.is_none() && body.is_empty() {
        return Err(EmentarioError::malformed(
            "card yielded no process key and no usable body",
        ));
    }

    debug!(
        process_key = process_key.as_deref().unwrap_or("<none>"),
        org = %org_text,
        body_len = body.len(),
        "normalized record"
    );

    Ok(Entry {
        process_key,
        header_lines: header_lines.to_vec(),
        org_text,
        relator,
        document_type,
        publication_label,
        body,
    })
}

/// Find the first header line containing the marker and return the text
/// after it.
fn find_after_marker(header_lines: &[String], marker: &Regex) -> String {
    for line in header_lines {
        let trimmed = line.trim();
        if let Some(m) = marker.find(trimmed) {
            return trimmed[m.end()..].trim().to_string();
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_all_header_fields() {
        let lines = header(&[
            "TRT3 - ROT 0010203-04.2023.5.03.0001",
            "Recurso Ordinário Trabalhista",
            "TRT3 - 1ª Turma",
            "Relatoria de Maria da Silva",
            "Juntado aos autos em 12/03/2024",
        ]);
        let entry = normalize(&lines, "Ementa: HORAS EXTRAS. Devidas.").expect("normalize");

        assert_eq!(
            entry.process_key.as_deref(),
            Some("0010203-04.2023.5.03.0001")
        );
        assert_eq!(entry.document_type, "Recurso Ordinário Trabalhista");
        assert_eq!(entry.org_text, "TRT3 - 1ª Turma");
        assert_eq!(entry.relator, "Maria da Silva");
        assert_eq!(entry.publication_label, "12/03/2024");
        assert_eq!(entry.body, "HORAS EXTRAS. Devidas.");
    }

    #[test]
    fn process_key_only_searched_in_first_two_lines() {
        let lines = header(&[
            "TRT24 - AP",
            "Agravo de Petição",
            "0000123-45.2020.5.24.0002 aparece tarde demais",
        ]);
        let entry = normalize(&lines, "corpo qualquer").expect("normalize");
        assert_eq!(entry.process_key, None);
    }

    #[test]
    fn falls_back_to_forum_tag_when_no_turma_line() {
        let lines = header(&["TRT24 - ROT 0000123-45.2020.5.24.0002", "ROT"]);
        let entry = normalize(&lines, "corpo").expect("normalize");
        assert_eq!(entry.org_text, "TRT24");
    }

    #[test]
    fn missing_key_is_not_fatal_with_usable_body() {
        let lines = header(&["sem número", "tipo"]);
        let entry = normalize(&lines, "Ementa: texto útil").expect("normalize");
        assert_eq!(entry.process_key, None);
        assert_eq!(entry.body, "texto útil");
    }

    #[test]
    fn malformed_when_no_key_and_no_body() {
        let lines = header(&["sem número"]);
        let err = normalize(&lines, "   ").expect_err("should fail");
        assert!(matches!(err, EmentarioError::MalformedRecord { .. }));
    }

    #[test]
    fn empty_body_with_key_is_allowed() {
        let lines = header(&["TRT3 - ROT 0010203-04.2023.5.03.0001"]);
        let entry = normalize(&lines, "").expect("normalize");
        assert!(entry.body.is_empty());
        assert!(entry.process_key.is_some());
    }
}

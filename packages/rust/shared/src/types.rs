//! Core domain types for Ementário harvest runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for harvest run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// Canonical token classifying a record's organizational origin.
///
/// Derived deterministically from the free-text "Órgão Judicante" label and
/// never mutated. The `Display` form is the canonical token used for
/// bookmark names and the run summary: `CSJT`, `Pleno`, `Especial`,
/// `3ª`, `TRT3`, `TRT3_1ª`, `Processo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    /// Conselho Superior da Justiça do Trabalho.
    Csjt,
    /// Tribunal Pleno.
    Pleno,
    /// Órgão Especial.
    Especial,
    /// A turma without its forum (`"<n>ª"`).
    Turma(u8),
    /// A regional forum without a turma (`"TRT<k>"`).
    Trt(u8),
    /// A turma within a regional forum (`"TRT<k>_<n>ª"`).
    TrtTurma(u8, u8),
    /// The organizational text matched no rule.
    Unclassified,
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Csjt => write!(f, "CSJT"),
            Identifier::Pleno => write!(f, "Pleno"),
            Identifier::Especial => write!(f, "Especial"),
            Identifier::Turma(n) => write!(f, "{n}ª"),
            Identifier::Trt(k) => write!(f, "TRT{k}"),
            Identifier::TrtTurma(k, n) => write!(f, "TRT{k}_{n}ª"),
            Identifier::Unclassified => write!(f, "Processo"),
        }
    }
}

impl Serialize for Identifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for Identifier {
    type Err = String;

    /// Parse a canonical token back into an identifier.
    ///
    /// Inverse of `Display` — this parses tokens, not free-text labels;
    /// classification of free text lives in `ementario-classify`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "CSJT" => return Ok(Identifier::Csjt),
            "Pleno" => return Ok(Identifier::Pleno),
            "Especial" => return Ok(Identifier::Especial),
            "Processo" => return Ok(Identifier::Unclassified),
            _ => {}
        }
        if let Some(rest) = s.strip_prefix("TRT") {
            if let Some((forum, turma)) = rest.split_once('_') {
                let k = forum.parse::<u8>().map_err(|_| format!("bad token: {s}"))?;
                let n = turma
                    .strip_suffix('ª')
                    .and_then(|t| t.parse::<u8>().ok())
                    .ok_or_else(|| format!("bad token: {s}"))?;
                return Ok(Identifier::TrtTurma(k, n));
            }
            let k = rest.parse::<u8>().map_err(|_| format!("bad token: {s}"))?;
            return Ok(Identifier::Trt(k));
        }
        if let Some(n) = s.strip_suffix('ª').and_then(|t| t.parse::<u8>().ok()) {
            return Ok(Identifier::Turma(n));
        }
        Err(format!("bad token: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A normalized, structured record ready for document placement.
///
/// Created once per harvested card and immutable after normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Stable process number (`NNNNNNN-NN.NNNN.N.NN.NNNN`) used for
    /// cross-page deduplication. `None` marks the entry un-deduplicable
    /// (card-id dedup still applies within its page).
    pub process_key: Option<String>,
    /// Raw header lines as surfaced by the source, in order.
    pub header_lines: Vec<String>,
    /// Free-text organizational label ("Órgão Judicante").
    pub org_text: String,
    /// Relator name, extracted after the "Relatoria de" marker.
    pub relator: String,
    /// Document type, usually the second header line.
    pub document_type: String,
    /// Publication label, extracted after "Juntado aos autos em".
    pub publication_label: String,
    /// Cleaned ementa body.
    pub body: String,
}

// ---------------------------------------------------------------------------
// Section and TOC
// ---------------------------------------------------------------------------

/// The first-class grouping unit in the output document, one per identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Owning identifier.
    pub identifier: Identifier,
    /// Human-readable section title from the label resolver.
    pub title: String,
    /// Sanitized, document-legal, unique anchor name.
    pub bookmark_name: String,
    /// Strictly increasing creation counter within a run.
    pub first_seen_order: u32,
}

/// A single line of the rebuilt table of contents.
///
/// TOC lines are rebuilt wholesale on every reconciliation pass; they are
/// never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocLine {
    /// Owning identifier.
    pub identifier: Identifier,
    /// Display label.
    pub label: String,
    /// Resolved page number, or `None` while the layout oracle cannot
    /// compute one yet.
    pub page: Option<u32>,
    /// Bookmark anchor this line points at.
    pub bookmark_name: String,
}

// ---------------------------------------------------------------------------
// HarvestSummary
// ---------------------------------------------------------------------------

/// Per-target statistics accumulated during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetStats {
    /// Search target label (e.g., "TRT 3 / 1ª Turma").
    pub target: String,
    /// Entries emitted into the document.
    pub entries: usize,
    /// Cards skipped as duplicates (card-id or process-key).
    pub duplicates_skipped: usize,
    /// Extraction attempts that failed after retry.
    pub failed_attempts: u32,
    /// Pages visited before termination.
    pub pages_visited: u32,
    /// Whether a source advance failure ended this target early.
    pub advance_failed: bool,
}

/// Summary of a completed harvest run, written as `summary.json` next to
/// the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestSummary {
    /// Unique identifier for this run.
    pub run_id: RunId,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Total sections created in the document.
    pub sections: usize,
    /// Total entries appended.
    pub entries: usize,
    /// Total duplicate skips across all targets.
    pub duplicates_skipped: usize,
    /// Total failed extraction attempts across all targets.
    pub failed_attempts: u32,
    /// Targets whose traversal ended on an advance failure.
    pub advance_failures: usize,
    /// Per-target breakdown.
    pub targets: Vec<TargetStats>,
    /// Total elapsed milliseconds.
    pub elapsed_ms: u64,
}

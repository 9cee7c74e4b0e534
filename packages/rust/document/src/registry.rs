//! Bookmark/section registry.
//!
//! Tracks, per identifier, whether a section already exists in the output
//! document and creates it exactly once per run. Guarded initialization:
//! presence check plus insert, never eviction — a section created for an
//! identifier stays for the lifetime of the run.

use std::collections::HashMap;

use tracing::debug;

use ementario_classify::label_for;
use ementario_shared::{Identifier, Section};

/// Per-run registry of sections keyed by identifier.
#[derive(Debug, Default)]
pub struct SectionRegistry {
    sections: HashMap<Identifier, Section>,
    /// Bookmark name → owning identifier, for collision defense.
    names: HashMap<String, Identifier>,
    next_order: u32,
}

impl SectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the section for an identifier.
    ///
    /// Idempotent: the second call for the same identifier returns the
    /// same section, with the same bookmark name, without growing the
    /// registry.
    pub fn ensure_section(&mut self, identifier: Identifier) -> &Section {
        if !self.sections.contains_key(&identifier) {
            let title = label_for(&identifier);
            let bookmark_name = self.unique_bookmark_name(&identifier);
            let first_seen_order = self.next_order;
            self.next_order += 1;

            debug!(%identifier, %bookmark_name, first_seen_order, "created section");

            self.names.insert(bookmark_name.clone(), identifier);
            self.sections.insert(
                identifier,
                Section {
                    identifier,
                    title,
                    bookmark_name,
                    first_seen_order,
                },
            );
        }

        self.sections
            .get(&identifier)
            .expect("section present after guarded insert")
    }

    /// Look up a section without creating it.
    pub fn section_for(&self, identifier: &Identifier) -> Option<&Section> {
        self.sections.get(identifier)
    }

    /// All sections, in no particular order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// Number of sections created so far.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Derive a document-legal bookmark name, unique within the registry.
    ///
    /// Identifiers are disjoint tokens, so a collision should not happen;
    /// it is defended against anyway by numeric suffixing.
    fn unique_bookmark_name(&self, identifier: &Identifier) -> String {
        let base = sanitize_bookmark_name(&identifier.to_string());

        if !self.owned_by_other(&base, identifier) {
            return base;
        }

        let mut suffix = 2u32;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !self.owned_by_other(&candidate, identifier) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn owned_by_other(&self, name: &str, identifier: &Identifier) -> bool {
        self.names
            .get(name)
            .is_some_and(|owner| owner != identifier)
    }
}

/// Sanitize an identifier token into a bookmark name: `BM_` prefix (which
/// also guarantees a letter-initial name), non-alphanumeric runs collapsed
/// to a single `_`, trailing underscores dropped.
pub fn sanitize_bookmark_name(token: &str) -> String {
    let mut out = String::from("BM_");
    let mut last_was_underscore = true;

    for c in token.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            out.push('_');
            last_was_underscore = true;
        }
    }

    out.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_section_is_idempotent() {
        let mut registry = SectionRegistry::new();

        let first = registry.ensure_section(Identifier::TrtTurma(3, 1)).clone();
        assert_eq!(registry.len(), 1);

        let second = registry.ensure_section(Identifier::TrtTurma(3, 1)).clone();
        assert_eq!(registry.len(), 1);
        assert_eq!(first.bookmark_name, second.bookmark_name);
        assert_eq!(first.first_seen_order, second.first_seen_order);
    }

    #[test]
    fn first_seen_order_is_strictly_increasing() {
        let mut registry = SectionRegistry::new();
        let a = registry.ensure_section(Identifier::Csjt).first_seen_order;
        let b = registry.ensure_section(Identifier::Trt(3)).first_seen_order;
        let c = registry.ensure_section(Identifier::Turma(2)).first_seen_order;
        assert!(a < b && b < c);
    }

    #[test]
    fn section_for_does_not_create() {
        let mut registry = SectionRegistry::new();
        assert!(registry.section_for(&Identifier::Pleno).is_none());
        registry.ensure_section(Identifier::Pleno);
        assert!(registry.section_for(&Identifier::Pleno).is_some());
    }

    #[test]
    fn bookmark_names_are_sanitized() {
        assert_eq!(sanitize_bookmark_name("TRT3_1ª"), "BM_TRT3_1");
        assert_eq!(sanitize_bookmark_name("3ª"), "BM_3");
        assert_eq!(sanitize_bookmark_name("CSJT"), "BM_CSJT");
        assert_eq!(sanitize_bookmark_name("Processo"), "BM_Processo");
    }

    #[test]
    fn bookmark_names_never_start_with_digit() {
        for ident in [
            Identifier::Turma(1),
            Identifier::Trt(24),
            Identifier::TrtTurma(3, 2),
        ] {
            let name = sanitize_bookmark_name(&ident.to_string());
            assert!(name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn sections_get_titles_from_label_resolver() {
        let mut registry = SectionRegistry::new();
        let section = registry.ensure_section(Identifier::Csjt);
        assert_eq!(section.title, "Decisão CSJT");
    }

    #[test]
    fn name_collision_resolved_by_suffixing() {
        let mut registry = SectionRegistry::new();
        // Force a collision: another identifier already owns the name the
        // sanitizer would produce for Turma(3).
        registry.names.insert("BM_3".into(), Identifier::Trt(99));

        let section = registry.ensure_section(Identifier::Turma(3));
        assert_eq!(section.bookmark_name, "BM_3_2");
    }

    #[test]
    fn distinct_identifiers_get_distinct_bookmarks() {
        let mut registry = SectionRegistry::new();
        let a = registry.ensure_section(Identifier::Trt(3)).bookmark_name.clone();
        let b = registry
            .ensure_section(Identifier::TrtTurma(3, 1))
            .bookmark_name
            .clone();
        assert_ne!(a, b);
    }
}

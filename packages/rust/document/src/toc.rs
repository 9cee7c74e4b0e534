//! TOC (table of contents) reconciliation.
//!
//! Re-derives the canonical entry order from the section registry and
//! resolves page numbers through the layout oracle. The result replaces
//! any previous TOC content wholesale — the rebuild is destructive and
//! idempotent, so a later pass with better page numbers simply produces a
//! fresh, fully consistent set of lines.

use tracing::debug;

use ementario_shared::{Identifier, Section, TocLine};

use crate::oracle::LayoutOracle;
use crate::registry::SectionRegistry;

/// Rebuild the full TOC line set for the current registry state.
///
/// Ordering policy: the fixed priority list `CSJT, Pleno, Especial,
/// 1ª..8ª` first; then regional forums by ascending number, each forum
/// heading before its own turmas and turmas ascending; everything else
/// (including unclassified sections) trails in first-seen order. Only the
/// tail depends on discovery order.
///
/// Sections whose bookmark the oracle cannot resolve yet are emitted with
/// `page: None`, never dropped — the next reconciliation pass fills them
/// in.
pub fn rebuild_toc(registry: &SectionRegistry, oracle: &dyn LayoutOracle) -> Vec<TocLine> {
    let mut sections: Vec<&Section> = registry.sections().collect();
    sections.sort_by_key(|section| order_key(section));

    let lines: Vec<TocLine> = sections
        .into_iter()
        .map(|section| TocLine {
            identifier: section.identifier,
            label: section.title.clone(),
            page: oracle.resolve_page(&section.bookmark_name),
            bookmark_name: section.bookmark_name.clone(),
        })
        .collect();

    debug!(
        lines = lines.len(),
        unresolved = lines.iter().filter(|l| l.page.is_none()).count(),
        "TOC rebuilt"
    );

    lines
}

/// Total order over sections.
///
/// Group 0: the fixed priority list, by list position.
/// Group 1: TRT identifiers, by (forum, turma) with forum-only first.
/// Group 2: everything else, by first-seen order.
fn order_key(section: &Section) -> (u8, u32, u32) {
    match section.identifier {
        Identifier::Csjt => (0, 0, 0),
        Identifier::Pleno => (0, 1, 0),
        Identifier::Especial => (0, 2, 0),
        Identifier::Turma(n) if (1..=8).contains(&n) => (0, 2 + n as u32, 0),
        Identifier::Trt(k) => (1, k as u32, 0),
        Identifier::TrtTurma(k, n) => (1, k as u32, 1 + n as u32),
        _ => (2, section.first_seen_order, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Oracle backed by a fixed bookmark → page table.
    struct TableOracle(Vec<(String, u32)>);

    impl LayoutOracle for TableOracle {
        fn resolve_page(&self, bookmark_name: &str) -> Option<u32> {
            self.0
                .iter()
                .find(|(name, _)| name == bookmark_name)
                .map(|(_, page)| *page)
        }
    }

    struct UnknownOracle;

    impl LayoutOracle for UnknownOracle {
        fn resolve_page(&self, _bookmark_name: &str) -> Option<u32> {
            None
        }
    }

    fn registry_with(identifiers: &[Identifier]) -> SectionRegistry {
        let mut registry = SectionRegistry::new();
        for ident in identifiers {
            registry.ensure_section(*ident);
        }
        registry
    }

    #[test]
    fn priority_list_before_forums() {
        // Discovery order deliberately scrambled.
        let registry = registry_with(&[
            Identifier::TrtTurma(3, 2),
            Identifier::TrtTurma(3, 1),
            Identifier::Csjt,
            Identifier::Turma(3),
        ]);

        let toc = rebuild_toc(&registry, &UnknownOracle);
        let order: Vec<Identifier> = toc.iter().map(|l| l.identifier).collect();
        assert_eq!(
            order,
            vec![
                Identifier::Csjt,
                Identifier::Turma(3),
                Identifier::TrtTurma(3, 1),
                Identifier::TrtTurma(3, 2),
            ]
        );
    }

    #[test]
    fn forum_only_precedes_its_turmas_across_forums() {
        let registry = registry_with(&[
            Identifier::TrtTurma(24, 1),
            Identifier::Trt(24),
            Identifier::TrtTurma(3, 5),
            Identifier::Trt(3),
        ]);

        let toc = rebuild_toc(&registry, &UnknownOracle);
        let order: Vec<Identifier> = toc.iter().map(|l| l.identifier).collect();
        assert_eq!(
            order,
            vec![
                Identifier::Trt(3),
                Identifier::TrtTurma(3, 5),
                Identifier::Trt(24),
                Identifier::TrtTurma(24, 1),
            ]
        );
    }

    #[test]
    fn order_is_independent_of_discovery_sequence() {
        let idents = [
            Identifier::Csjt,
            Identifier::Pleno,
            Identifier::Especial,
            Identifier::Turma(1),
            Identifier::Turma(8),
            Identifier::Trt(3),
            Identifier::TrtTurma(3, 1),
            Identifier::TrtTurma(24, 2),
        ];

        let baseline: Vec<Identifier> = rebuild_toc(&registry_with(&idents), &UnknownOracle)
            .iter()
            .map(|l| l.identifier)
            .collect();

        // Rotate through several discovery permutations; the classified
        // portion of the order must never move.
        let mut permuted = idents;
        for rotation in 1..idents.len() {
            permuted.rotate_left(1);
            let order: Vec<Identifier> = rebuild_toc(&registry_with(&permuted), &UnknownOracle)
                .iter()
                .map(|l| l.identifier)
                .collect();
            assert_eq!(order, baseline, "rotation {rotation}");
        }
    }

    #[test]
    fn unclassified_tail_follows_first_seen_order() {
        let mut registry = SectionRegistry::new();
        registry.ensure_section(Identifier::Unclassified);
        registry.ensure_section(Identifier::Turma(9)); // outside the 1ª..8ª list
        registry.ensure_section(Identifier::Csjt);

        let toc = rebuild_toc(&registry, &UnknownOracle);
        let order: Vec<Identifier> = toc.iter().map(|l| l.identifier).collect();
        assert_eq!(
            order,
            vec![
                Identifier::Csjt,
                Identifier::Unclassified,
                Identifier::Turma(9),
            ]
        );
    }

    #[test]
    fn unresolved_pages_are_kept_and_filled_in_later() {
        let registry = registry_with(&[Identifier::Csjt, Identifier::Trt(3)]);

        let first_pass = rebuild_toc(&registry, &UnknownOracle);
        assert_eq!(first_pass.len(), 2);
        assert!(first_pass.iter().all(|l| l.page.is_none()));

        let csjt_bm = registry
            .section_for(&Identifier::Csjt)
            .map(|s| s.bookmark_name.clone())
            .expect("section");
        let oracle = TableOracle(vec![(csjt_bm, 4)]);

        let second_pass = rebuild_toc(&registry, &oracle);
        assert_eq!(second_pass.len(), 2);
        assert_eq!(second_pass[0].page, Some(4));
        assert_eq!(second_pass[1].page, None);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let registry = registry_with(&[Identifier::Pleno, Identifier::TrtTurma(3, 1)]);
        let a = rebuild_toc(&registry, &UnknownOracle);
        let b = rebuild_toc(&registry, &UnknownOracle);
        assert_eq!(a, b);
    }
}

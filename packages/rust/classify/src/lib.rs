//! Identifier classification and label resolution.
//!
//! [`classify`] maps a free-text organizational label ("Órgão Judicante")
//! to a canonical [`Identifier`]; [`label_for`] maps an identifier back to
//! the section title used in the output document. Both are pure — the
//! classifier is also consulted at TOC-ordering time and must not depend
//! on mutable state.

mod rules;

use tracing::trace;

use ementario_shared::Identifier;

/// Classify a free-text organizational label.
///
/// The text is normalized (diacritics folded, punctuation dropped,
/// whitespace collapsed, lowercased), then matched against the ordered
/// rule table in [`rules`]. Same input always yields the same identifier.
pub fn classify(org_text: &str) -> Identifier {
    let normalized = normalize_org_text(org_text);
    if normalized.is_empty() {
        return Identifier::Unclassified;
    }

    for rule in rules::RULES {
        if let Some(ident) = (rule.apply)(&normalized) {
            trace!(rule = rule.name, %ident, "classified organizational text");
            return ident;
        }
    }

    Identifier::Unclassified
}

/// The section title for an identifier.
///
/// The match is exhaustive on purpose: adding an identifier variant
/// without a label is a compile error, which keeps this the exact inverse
/// vocabulary of [`classify`].
pub fn label_for(identifier: &Identifier) -> String {
    match identifier {
        Identifier::Csjt => "Decisão CSJT".to_string(),
        Identifier::Pleno => "Decisão Tribunal Pleno".to_string(),
        Identifier::Especial => "Decisão Órgão Especial".to_string(),
        Identifier::TrtTurma(k, n) => format!("TRT {k} - {n}ª Turma"),
        Identifier::Trt(k) => format!("TRT {k} - Acórdãos"),
        Identifier::Turma(n) => format!("Acórdão {n}ª Turma"),
        Identifier::Unclassified => "Processo".to_string(),
    }
}

/// Normalize organizational text for rule matching.
///
/// Folds Portuguese diacritics to ASCII, keeps the ordinal marker `ª`
/// (turma patterns depend on it), replaces other punctuation with spaces,
/// lowercases, and collapses whitespace runs.
pub fn normalize_org_text(text: &str) -> String {
    let folded: String = text.chars().map(fold_diacritic).collect();

    let mut out = String::with_capacity(folded.len());
    let mut last_was_space = true;
    for c in folded.chars() {
        let keep = c.is_ascii_alphanumeric() || c == 'ª';
        if keep {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Fold one character's diacritic to its ASCII base. `ª` passes through.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forum_with_turma() {
        assert_eq!(classify("TRT3 - 1ª Turma"), Identifier::TrtTurma(3, 1));
        assert_eq!(classify("TRT 24 - 2ª Turma"), Identifier::TrtTurma(24, 2));
        assert_eq!(classify("trt3 1 turma"), Identifier::TrtTurma(3, 1));
    }

    #[test]
    fn forum_without_turma() {
        assert_eq!(classify("TRT3 - ROT 0010203-04.2023.5.03.0001"), Identifier::Trt(3));
        assert_eq!(classify("TRT24"), Identifier::Trt(24));
    }

    #[test]
    fn forum_takes_precedence_over_bare_turma() {
        // Both patterns present: the forum rule must win and fold the
        // turma into the forum identifier.
        assert_eq!(classify("1ª Turma do TRT 3"), Identifier::TrtTurma(3, 1));
    }

    #[test]
    fn bare_turma() {
        assert_eq!(classify("3ª Turma"), Identifier::Turma(3));
        assert_eq!(classify("8ª TURMA"), Identifier::Turma(8));
    }

    #[test]
    fn special_bodies() {
        assert_eq!(
            classify("Conselho Superior da Justiça do Trabalho"),
            Identifier::Csjt
        );
        assert_eq!(classify("CSJT"), Identifier::Csjt);
        assert_eq!(classify("Tribunal Pleno"), Identifier::Pleno);
        assert_eq!(classify("Órgão Especial"), Identifier::Especial);
    }

    #[test]
    fn unclassified_fallback() {
        assert_eq!(classify(""), Identifier::Unclassified);
        assert_eq!(classify("Vara do Trabalho de Betim"), Identifier::Unclassified);
    }

    #[test]
    fn classify_is_deterministic() {
        let inputs = ["TRT3 - 1ª Turma", "Tribunal Pleno", "qualquer coisa"];
        for input in inputs {
            assert_eq!(classify(input), classify(input));
        }
    }

    #[test]
    fn labels_match_vocabulary() {
        assert_eq!(label_for(&Identifier::Csjt), "Decisão CSJT");
        assert_eq!(label_for(&Identifier::Pleno), "Decisão Tribunal Pleno");
        assert_eq!(label_for(&Identifier::Especial), "Decisão Órgão Especial");
        assert_eq!(label_for(&Identifier::TrtTurma(3, 1)), "TRT 3 - 1ª Turma");
        assert_eq!(label_for(&Identifier::Trt(24)), "TRT 24 - Acórdãos");
        assert_eq!(label_for(&Identifier::Turma(5)), "Acórdão 5ª Turma");
        assert_eq!(label_for(&Identifier::Unclassified), "Processo");
    }

    #[test]
    fn forum_turma_label_contains_both_numbers() {
        for k in 1u8..=24 {
            for n in 1u8..=8 {
                let ident = classify(&format!("TRT{k} - {n}ª Turma"));
                assert_eq!(ident, Identifier::TrtTurma(k, n));
                let label = label_for(&ident);
                assert!(label.contains(&k.to_string()), "label {label} missing forum {k}");
                assert!(label.contains(&format!("{n}ª")), "label {label} missing turma {n}");
            }
        }
    }

    #[test]
    fn normalization_strips_diacritics_and_punctuation() {
        assert_eq!(
            normalize_org_text("Órgão Especial — Sessão"),
            "orgao especial sessao"
        );
        assert_eq!(normalize_org_text("  TRT3 -  1ª Turma "), "trt3 1ª turma");
    }
}

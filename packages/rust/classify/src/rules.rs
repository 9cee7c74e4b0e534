//! Ordered classification rule table.
//!
//! Each rule inspects the normalized organizational text and either
//! produces an identifier or passes. Rules run top to bottom, so
//! precedence is explicit: a forum match (with or without a turma) wins
//! over a bare turma match, which wins over the literal special bodies.

use std::sync::LazyLock;

use regex::Regex;

use ementario_shared::Identifier;

/// A single classification rule over normalized text.
pub(crate) struct Rule {
    /// Rule name, used for tracing and tests.
    pub name: &'static str,
    /// Returns `Some` when the rule matches.
    pub apply: fn(&str) -> Option<Identifier>,
}

/// The classification grammar, in precedence order.
pub(crate) static RULES: &[Rule] = &[
    Rule {
        name: "forum",
        apply: forum_rule,
    },
    Rule {
        name: "bare-turma",
        apply: bare_turma_rule,
    },
    Rule {
        name: "csjt",
        apply: csjt_rule,
    },
    Rule {
        name: "pleno",
        apply: pleno_rule,
    },
    Rule {
        name: "especial",
        apply: especial_rule,
    },
];

static TRT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btrt\s*(\d{1,2})\b").expect("valid regex"));

static TURMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*ª?\s*turma").expect("valid regex"));

/// `TRT<k>`, optionally with a turma number ("trt3 - 1ª turma").
fn forum_rule(text: &str) -> Option<Identifier> {
    let forum = TRT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok())?;

    match turma_number(text) {
        Some(turma) => Some(Identifier::TrtTurma(forum, turma)),
        None => Some(Identifier::Trt(forum)),
    }
}

/// A turma number with no forum in sight ("3ª turma").
fn bare_turma_rule(text: &str) -> Option<Identifier> {
    turma_number(text).map(Identifier::Turma)
}

fn csjt_rule(text: &str) -> Option<Identifier> {
    (text.contains("csjt") || text.contains("conselho superior da justica do trabalho"))
        .then_some(Identifier::Csjt)
}

fn pleno_rule(text: &str) -> Option<Identifier> {
    text.contains("tribunal pleno").then_some(Identifier::Pleno)
}

fn especial_rule(text: &str) -> Option<Identifier> {
    text.contains("orgao especial").then_some(Identifier::Especial)
}

fn turma_number(text: &str) -> Option<u8> {
    TURMA_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok())
}

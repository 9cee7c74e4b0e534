//! Run-plan construction: which search targets a harvest run traverses.

use ementario_shared::{EmentarioError, Result};

use crate::pipeline::SearchTarget;

/// Highest regional forum number.
const MAX_FORUM: u8 = 24;

/// One target per regional forum, 1 through 24.
pub fn default_plan() -> Vec<SearchTarget> {
    (1..=MAX_FORUM)
        .map(|k| SearchTarget {
            label: format!("TRT {k}"),
            query: format!("TRT{k}"),
        })
        .collect()
}

/// Parse user-supplied target specs into a plan.
///
/// Accepted forms: `trt3` (whole forum), `trt3/1` (one turma), `csjt`,
/// `pleno`, `especial`. Case-insensitive.
pub fn targets_from_specs(specs: &[String]) -> Result<Vec<SearchTarget>> {
    specs.iter().map(|spec| parse_spec(spec)).collect()
}

fn parse_spec(spec: &str) -> Result<SearchTarget> {
    let lowered = spec.trim().to_lowercase();

    match lowered.as_str() {
        "csjt" => {
            return Ok(SearchTarget {
                label: "CSJT".into(),
                query: "CSJT".into(),
            });
        }
        "pleno" => {
            return Ok(SearchTarget {
                label: "Tribunal Pleno".into(),
                query: "Tribunal Pleno".into(),
            });
        }
        "especial" => {
            return Ok(SearchTarget {
                label: "Órgão Especial".into(),
                query: "Órgão Especial".into(),
            });
        }
        _ => {}
    }

    let rest = lowered
        .strip_prefix("trt")
        .ok_or_else(|| EmentarioError::validation(format!("unrecognized target: {spec}")))?;

    let (forum_part, turma_part) = match rest.split_once('/') {
        Some((f, t)) => (f, Some(t)),
        None => (rest, None),
    };

    let forum: u8 = forum_part
        .parse()
        .map_err(|_| EmentarioError::validation(format!("bad forum number in target: {spec}")))?;
    if forum == 0 || forum > MAX_FORUM {
        return Err(EmentarioError::validation(format!(
            "forum out of range in target: {spec}"
        )));
    }

    match turma_part {
        None => Ok(SearchTarget {
            label: format!("TRT {forum}"),
            query: format!("TRT{forum}"),
        }),
        Some(t) => {
            let turma: u8 = t.trim_end_matches('ª').parse().map_err(|_| {
                EmentarioError::validation(format!("bad turma number in target: {spec}"))
            })?;
            Ok(SearchTarget {
                label: format!("TRT {forum} / {turma}ª Turma"),
                query: format!("TRT{forum} {turma}ª Turma"),
            })
        }
    }
}

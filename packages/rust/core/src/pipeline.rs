//! End-to-end harvest pipeline: targets → traversal → classification →
//! document assembly → TOC reconciliation → summary.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument, warn};

use ementario_classify::classify;
use ementario_document::{DocumentSink, MarkdownDocument, SectionRegistry, rebuild_toc};
use ementario_harvest::{
    CancellationToken, RecordSource, RunContext, TraversalEngine, TraversalLimits,
};
use ementario_shared::{
    EmentarioError, HarvestConfig, HarvestSummary, Result, RunId, TargetStats,
};

/// One search target of the run plan, traversed as a unit.
#[derive(Debug, Clone)]
pub struct SearchTarget {
    /// Human-readable label ("TRT 3 / 1ª Turma").
    pub label: String,
    /// Search expression sent to the record source.
    pub query: String,
}

/// Configuration for one harvest run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Document title heading.
    pub title: String,
    /// Where the output document is written.
    pub output_path: PathBuf,
    /// Traversal policies and layout settings.
    pub harvest: HarvestConfig,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a target's traversal starts.
    fn target_started(&self, label: &str, current: usize, total: usize);
    /// Called when a target's traversal finishes.
    fn target_finished(&self, stats: &TargetStats);
    /// Called when the run completes.
    fn done(&self, summary: &HarvestSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn target_started(&self, _label: &str, _current: usize, _total: usize) {}
    fn target_finished(&self, _stats: &TargetStats) {}
    fn done(&self, _summary: &HarvestSummary) {}
}

/// Run the full harvest pipeline.
///
/// 1. Traverse each search target through the engine
/// 2. Classify entries and create sections on first occurrence
/// 3. Append entries to the document
/// 4. Reconcile the TOC after each target and once more at the end
/// 5. Save the document and the run summary
///
/// `make_source` builds one fresh source per target, so each target's page
/// cursor starts at the beginning.
#[instrument(skip_all, fields(targets = plan.len(), output = %options.output_path.display()))]
pub async fn run_harvest<S, F>(
    options: &RunOptions,
    plan: &[SearchTarget],
    mut make_source: F,
    cancel: CancellationToken,
    progress: &dyn ProgressReporter,
) -> Result<HarvestSummary>
where
    S: RecordSource,
    F: FnMut(&SearchTarget) -> Result<S>,
{
    if plan.is_empty() {
        return Err(EmentarioError::validation("run plan has no search targets"));
    }

    let start = Instant::now();
    let run_id = RunId::new();
    let started_at = chrono::Utc::now();

    info!(%run_id, targets = plan.len(), "starting harvest run");

    let mut doc = MarkdownDocument::new(&options.title, options.harvest.lines_per_page);
    let mut registry = SectionRegistry::new();
    let mut ctx = RunContext::new();

    let limits = TraversalLimits {
        max_pages: options.harvest.max_pages,
        max_attempts: options.harvest.max_attempts,
    };
    let engine = TraversalEngine::new(
        limits,
        &options.harvest.excluded_org_terms,
        cancel.clone(),
    );

    let mut target_stats: Vec<TargetStats> = Vec::with_capacity(plan.len());
    let mut total_entries = 0usize;

    for (i, target) in plan.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(remaining = plan.len() - i, "run cancelled, skipping remaining targets");
            break;
        }

        progress.target_started(&target.label, i + 1, plan.len());

        let mut source = match make_source(target) {
            Ok(source) => source,
            Err(e) => {
                warn!(target = %target.label, error = %e, "source setup failed, skipping target");
                target_stats.push(TargetStats {
                    target: target.label.clone(),
                    entries: 0,
                    duplicates_skipped: 0,
                    failed_attempts: 0,
                    pages_visited: 0,
                    advance_failed: true,
                });
                continue;
            }
        };

        let outcome = engine.traverse_section(&mut source, &mut ctx).await;

        for entry in &outcome.entries {
            let identifier = classify(&entry.org_text);

            // Section headings are appended exactly once, on first
            // occurrence of the identifier.
            if registry.section_for(&identifier).is_none() {
                let section = registry.ensure_section(identifier).clone();
                doc.append_section(&section.title, &section.bookmark_name)?;
            }
            doc.append_entry(entry)?;
        }
        total_entries += outcome.entries.len();

        // Reconcile after each target so an interrupted run still leaves
        // a consistent TOC behind.
        let toc = rebuild_toc(&registry, &doc);
        doc.replace_toc_region(&toc)?;

        let stats = TargetStats {
            target: target.label.clone(),
            entries: outcome.entries.len(),
            duplicates_skipped: outcome.duplicates_skipped,
            failed_attempts: outcome.failed_attempts,
            pages_visited: outcome.pages_visited,
            advance_failed: outcome.advance_failure.is_some(),
        };
        progress.target_finished(&stats);
        target_stats.push(stats);
    }

    // Final reconciliation: page estimates settle only once all content
    // (including the TOC region itself) is in place.
    progress.phase("Reconciling table of contents");
    let toc = rebuild_toc(&registry, &doc);
    doc.replace_toc_region(&toc)?;

    progress.phase("Saving document");
    doc.save(&options.output_path)?;

    let summary = HarvestSummary {
        run_id: run_id.clone(),
        started_at,
        sections: registry.len(),
        entries: total_entries,
        duplicates_skipped: target_stats.iter().map(|t| t.duplicates_skipped).sum(),
        failed_attempts: target_stats.iter().map(|t| t.failed_attempts).sum(),
        advance_failures: target_stats.iter().filter(|t| t.advance_failed).count(),
        targets: target_stats,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };

    write_summary(&options.output_path, &summary)?;
    progress.done(&summary);

    info!(
        %run_id,
        sections = summary.sections,
        entries = summary.entries,
        duplicates = summary.duplicates_skipped,
        failed_attempts = summary.failed_attempts,
        elapsed_ms = summary.elapsed_ms,
        "harvest run complete"
    );

    Ok(summary)
}

/// Path of the run summary written next to the output document.
pub fn summary_path(output_path: &std::path::Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("ementas");
    output_path.with_file_name(format!("{stem}.summary.json"))
}

fn write_summary(output_path: &std::path::Path, summary: &HarvestSummary) -> Result<()> {
    let path = summary_path(output_path);
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| EmentarioError::parse(format!("summary serialization: {e}")))?;
    std::fs::write(&path, json).map_err(|e| EmentarioError::io(&path, e))?;
    info!(path = %path.display(), "run summary written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use ementario_harvest::RawCard;
    use ementario_shared::HarvestConfig;

    /// Source that serves one fixed page of cards.
    struct FixedSource {
        cards: Vec<RawCard>,
        bodies: Vec<String>,
    }

    impl FixedSource {
        fn new(cards: Vec<(RawCard, String)>) -> Self {
            let (cards, bodies) = cards.into_iter().unzip();
            Self { cards, bodies }
        }
    }

    impl RecordSource for FixedSource {
        async fn fetch_cards(&mut self) -> ementario_shared::Result<Vec<RawCard>> {
            Ok(self.cards.clone())
        }

        async fn extract_body(&mut self, card: &RawCard) -> ementario_shared::Result<String> {
            let idx = self
                .cards
                .iter()
                .position(|c| c.ephemeral_id == card.ephemeral_id)
                .unwrap();
            Ok(self.bodies[idx].clone())
        }

        async fn advance(&mut self) -> ementario_shared::Result<bool> {
            Ok(false)
        }
    }

    fn card(id: &str, process: &str, org: &str) -> (RawCard, String) {
        (
            RawCard {
                ephemeral_id: id.to_string(),
                header_lines: vec![
                    format!("TRT3 - ROT {process}"),
                    "Recurso Ordinário Trabalhista".to_string(),
                    org.to_string(),
                ],
            },
            "Ementa: HORAS EXTRAS. Recurso conhecido e provido.".to_string(),
        )
    }

    fn options(dir: &std::path::Path) -> RunOptions {
        RunOptions {
            title: "Ementário".into(),
            output_path: dir.join("ementas.md"),
            harvest: HarvestConfig {
                max_pages: 10,
                max_attempts: 90,
                excluded_org_terms: vec![],
                rate_limit_ms: 0,
                request_timeout_secs: 5,
                min_body_len: 10,
                lines_per_page: 45,
            },
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ementario-pipeline-{tag}-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn run_assembles_document_and_summary() {
        let dir = temp_dir("basic");
        let options = options(&dir);

        let plan = vec![
            SearchTarget {
                label: "TRT 3 / 1ª Turma".into(),
                query: "trt3 1ª turma".into(),
            },
            SearchTarget {
                label: "TRT 3 / 2ª Turma".into(),
                query: "trt3 2ª turma".into(),
            },
        ];

        let summary = run_harvest(
            &options,
            &plan,
            |target| {
                Ok(if target.query.contains("1ª") {
                    FixedSource::new(vec![
                        card("a", "0010203-04.2023.5.03.0001", "TRT3 - 1ª Turma"),
                        card("b", "0020304-05.2023.5.03.0002", "TRT3 - 1ª Turma"),
                    ])
                } else {
                    FixedSource::new(vec![card(
                        "c",
                        "0030405-06.2023.5.03.0003",
                        "TRT3 - 2ª Turma",
                    )])
                })
            },
            CancellationToken::new(),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(summary.entries, 3);
        assert_eq!(summary.sections, 2);
        assert_eq!(summary.targets.len(), 2);

        let content = std::fs::read_to_string(&options.output_path).unwrap();
        assert!(content.contains("## TRT 3 - 1ª Turma"));
        assert!(content.contains("## TRT 3 - 2ª Turma"));
        // Forum-ordered TOC, with resolved pages.
        assert!(content.contains("- [TRT 3 - 1ª Turma](#BM_TRT3_1) — p. "));

        let summary_json = std::fs::read_to_string(summary_path(&options.output_path)).unwrap();
        let parsed: HarvestSummary = serde_json::from_str(&summary_json).unwrap();
        assert_eq!(parsed.entries, 3);
        // The persisted summary and the returned one describe the same run.
        assert_eq!(parsed.run_id, summary.run_id);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn duplicate_process_across_targets_appears_once() {
        let dir = temp_dir("dedup");
        let options = options(&dir);

        let plan = vec![
            SearchTarget {
                label: "alvo 1".into(),
                query: "um".into(),
            },
            SearchTarget {
                label: "alvo 2".into(),
                query: "dois".into(),
            },
        ];

        let summary = run_harvest(
            &options,
            &plan,
            |_| {
                Ok(FixedSource::new(vec![card(
                    "x",
                    "0010203-04.2023.5.03.0001",
                    "TRT3 - 1ª Turma",
                )]))
            },
            CancellationToken::new(),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(summary.entries, 1);
        assert_eq!(summary.duplicates_skipped, 1);

        let content = std::fs::read_to_string(&options.output_path).unwrap();
        assert_eq!(
            content.matches("- Processo: 0010203-04.2023.5.03.0001").count(),
            1
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn section_heading_created_once_across_targets() {
        let dir = temp_dir("once");
        let options = options(&dir);

        let plan = vec![
            SearchTarget {
                label: "alvo 1".into(),
                query: "um".into(),
            },
            SearchTarget {
                label: "alvo 2".into(),
                query: "dois".into(),
            },
        ];

        let mut call = 0;
        let summary = run_harvest(
            &options,
            &plan,
            |_| {
                call += 1;
                Ok(FixedSource::new(vec![card(
                    &format!("t{call}"),
                    &format!("00{call}0203-04.2023.5.03.000{call}"),
                    "TRT3 - 1ª Turma",
                )]))
            },
            CancellationToken::new(),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(summary.entries, 2);
        assert_eq!(summary.sections, 1);

        let content = std::fs::read_to_string(&options.output_path).unwrap();
        assert_eq!(content.matches("## TRT 3 - 1ª Turma").count(), 1);
        assert_eq!(content.matches("<a id=\"BM_TRT3_1\"></a>").count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_source_setup_skips_target_only() {
        let dir = temp_dir("skip");
        let options = options(&dir);

        let plan = vec![
            SearchTarget {
                label: "quebrado".into(),
                query: "quebrado".into(),
            },
            SearchTarget {
                label: "são".into(),
                query: "são".into(),
            },
        ];

        let summary = run_harvest(
            &options,
            &plan,
            |target| {
                if target.query == "quebrado" {
                    Err(EmentarioError::Source("connection refused".into()))
                } else {
                    Ok(FixedSource::new(vec![card(
                        "ok",
                        "0010203-04.2023.5.03.0001",
                        "TRT3 - 1ª Turma",
                    )]))
                }
            },
            CancellationToken::new(),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(summary.entries, 1);
        assert_eq!(summary.advance_failures, 1);
        assert_eq!(summary.targets.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn empty_plan_is_rejected() {
        let dir = temp_dir("empty");
        let options = options(&dir);

        let result = run_harvest(
            &options,
            &[],
            |_: &SearchTarget| Ok(FixedSource::new(vec![])),
            CancellationToken::new(),
            &SilentProgress,
        )
        .await;

        assert!(matches!(result, Err(EmentarioError::Validation { .. })));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn summary_path_is_a_sibling() {
        let path = summary_path(std::path::Path::new("/tmp/saida/ementas.md"));
        assert_eq!(path, PathBuf::from("/tmp/saida/ementas.summary.json"));
    }
}

//! Duplicate-safe traversal of a paginated record source.
//!
//! One section is traversed at a time: FetchPage → ExtractCards →
//! (AdvancePage | Terminate). Card identity is deduplicated per page,
//! process keys per run. Extraction failures are retried once on the same
//! card, then counted; `max_attempts` consecutive failures, `max_pages`,
//! a source that reports no further page, an advance failure, or
//! cancellation all terminate the section. Nothing here aborts the
//! enclosing run — failures come back as counts in [`SectionOutcome`].

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use ementario_classify::normalize_org_text;
use ementario_shared::{Entry, Result};

use crate::cancel::CancellationToken;
use crate::source::{RawCard, RecordSource};

/// Termination bounds for one section's traversal.
#[derive(Debug, Clone)]
pub struct TraversalLimits {
    /// Maximum pages visited.
    pub max_pages: u32,
    /// Maximum *consecutive* failed extractions before giving up.
    pub max_attempts: u32,
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_attempts: 90,
        }
    }
}

/// Run-scoped traversal state shared across sections.
///
/// Explicitly passed in (no process-wide singleton) so independent runs
/// never cross-contaminate. A process key recorded here is never
/// re-emitted as a new entry within the same run.
#[derive(Debug, Default)]
pub struct RunContext {
    seen_process_keys: HashSet<String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the key was already emitted this run.
    pub fn already_seen(&self, process_key: &str) -> bool {
        self.seen_process_keys.contains(process_key)
    }

    /// Record an emitted key. Keys are never removed within a run.
    pub fn record(&mut self, process_key: &str) {
        self.seen_process_keys.insert(process_key.to_string());
    }

    /// Number of distinct process keys emitted so far.
    pub fn keys_seen(&self) -> usize {
        self.seen_process_keys.len()
    }
}

/// What one section's traversal produced.
#[derive(Debug, Default)]
pub struct SectionOutcome {
    /// Entries emitted, in source order.
    pub entries: Vec<Entry>,
    /// Cards skipped as duplicates (card identity or process key).
    pub duplicates_skipped: usize,
    /// Cards skipped by the excluded-organization filter.
    pub excluded: usize,
    /// Extractions that failed after the single retry.
    pub failed_attempts: u32,
    /// Pages visited before termination.
    pub pages_visited: u32,
    /// Advance/fetch failure that ended the section, if any. Reported,
    /// not raised — the caller proceeds to the next section.
    pub advance_failure: Option<String>,
}

/// Traversal engine configured once per run.
#[derive(Debug)]
pub struct TraversalEngine {
    limits: TraversalLimits,
    /// Normalized excluded-organization terms.
    excluded_terms: Vec<String>,
    cancel: CancellationToken,
}

impl TraversalEngine {
    pub fn new(
        limits: TraversalLimits,
        excluded_org_terms: &[String],
        cancel: CancellationToken,
    ) -> Self {
        let excluded_terms = excluded_org_terms
            .iter()
            .map(|t| normalize_org_text(t))
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            limits,
            excluded_terms,
            cancel,
        }
    }

    /// Traverse one section of the source to completion.
    #[instrument(skip_all, fields(max_pages = self.limits.max_pages))]
    pub async fn traverse_section<S: RecordSource>(
        &self,
        source: &mut S,
        ctx: &mut RunContext,
    ) -> SectionOutcome {
        let mut outcome = SectionOutcome::default();
        let mut consecutive_failures: u32 = 0;
        let mut page: u32 = 1;

        'pages: loop {
            if self.cancel.is_cancelled() {
                info!("traversal cancelled between pages");
                break;
            }

            let cards = match source.fetch_cards().await {
                Ok(cards) => cards,
                Err(e) => {
                    warn!(error = %e, page, "page fetch failed, ending section");
                    outcome.advance_failure = Some(e.to_string());
                    break;
                }
            };
            outcome.pages_visited = page;

            if cards.is_empty() {
                debug!(page, "no cards on this page");
            }

            // Card identity is only meaningful within one page render.
            let mut seen_card_ids: HashSet<String> = HashSet::new();

            for card in &cards {
                if self.cancel.is_cancelled() {
                    info!("traversal cancelled between cards");
                    break 'pages;
                }

                if !seen_card_ids.insert(card.ephemeral_id.clone()) {
                    outcome.duplicates_skipped += 1;
                    continue;
                }

                if card.header_lines.is_empty() {
                    outcome.failed_attempts += 1;
                    consecutive_failures += 1;
                    if consecutive_failures >= self.limits.max_attempts {
                        warn!("consecutive failure limit reached, ending section");
                        break 'pages;
                    }
                    continue;
                }

                if self.is_excluded(card) {
                    debug!(card = %card.ephemeral_id, "card excluded by organization filter");
                    outcome.excluded += 1;
                    continue;
                }

                let body = match self.extract_with_retry(source, card).await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(card = %card.ephemeral_id, error = %e, "extraction failed after retry");
                        outcome.failed_attempts += 1;
                        consecutive_failures += 1;
                        if consecutive_failures >= self.limits.max_attempts {
                            warn!("consecutive failure limit reached, ending section");
                            break 'pages;
                        }
                        continue;
                    }
                };

                let entry = match ementario_extract::normalize(&card.header_lines, &body) {
                    Ok(entry) => entry,
                    Err(e) => {
                        debug!(card = %card.ephemeral_id, error = %e, "card skipped as malformed");
                        outcome.failed_attempts += 1;
                        consecutive_failures += 1;
                        if consecutive_failures >= self.limits.max_attempts {
                            warn!("consecutive failure limit reached, ending section");
                            break 'pages;
                        }
                        continue;
                    }
                };

                // Cross-page duplicates are expected with unstable
                // paginated listings: skip silently by process key.
                if let Some(key) = entry.process_key.as_deref() {
                    if ctx.already_seen(key) {
                        outcome.duplicates_skipped += 1;
                        continue;
                    }
                    ctx.record(key);
                }

                consecutive_failures = 0;
                outcome.entries.push(entry);
            }

            if page >= self.limits.max_pages {
                info!(page, "page limit reached, ending section");
                break;
            }

            match source.advance().await {
                Ok(true) => page += 1,
                Ok(false) => {
                    debug!(page, "source reports no further page");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, page, "advance failed, ending section");
                    outcome.advance_failure = Some(e.to_string());
                    break;
                }
            }
        }

        info!(
            entries = outcome.entries.len(),
            duplicates = outcome.duplicates_skipped,
            excluded = outcome.excluded,
            failed_attempts = outcome.failed_attempts,
            pages = outcome.pages_visited,
            "section traversal finished"
        );

        outcome
    }

    /// Extract a card's body, re-fetching the same card once on failure.
    async fn extract_with_retry<S: RecordSource>(
        &self,
        source: &mut S,
        card: &RawCard,
    ) -> Result<String> {
        match source.extract_body(card).await {
            Ok(body) => Ok(body),
            Err(first) => {
                debug!(card = %card.ephemeral_id, error = %first, "extraction failed, retrying once");
                source.extract_body(card).await
            }
        }
    }

    /// Whether any header line matches an excluded organization term.
    fn is_excluded(&self, card: &RawCard) -> bool {
        if self.excluded_terms.is_empty() {
            return false;
        }
        card.header_lines.iter().any(|line| {
            let normalized = normalize_org_text(line);
            self.excluded_terms.iter().any(|term| normalized.contains(term))
        })
    }
}

//! HTTP-backed record source for the jurisprudence results page.
//!
//! Fetches one results page at a time, locates result cards through an
//! ordered selector fallback (the markup has shifted between site
//! releases), and keeps each card's raw text blob for body extraction.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};
use url::Url;

use ementario_shared::{EmentarioError, HarvestConfig, Result};

use crate::source::{RawCard, RecordSource};

/// User-Agent string for source requests.
const USER_AGENT: &str = concat!("Ementario/", env!("CARGO_PKG_VERSION"));

/// Result-card selectors, tried in order until one matches.
const CARD_SELECTORS: &[&str] = &[
    "div.ementa",
    "div.resultado",
    "div.acordao",
    "article",
    "div.item",
];

/// Header lines are the card's leading lines, up to the body marker.
const MAX_HEADER_LINES: usize = 6;

/// Record source backed by plain HTTP fetches of the results listing.
pub struct HtmlRecordSource {
    client: Client,
    base_url: Url,
    /// Search expression sent as the `q` parameter.
    query: String,
    page: u32,
    rate_limit_ms: u64,
    min_body_len: usize,
    /// Raw text blobs for the current page, keyed by card id.
    bodies: HashMap<String, String>,
    /// Whether the last fetched page linked to a further page.
    has_next: bool,
}

impl HtmlRecordSource {
    pub fn new(base_url: &str, query: &str, config: &HarvestConfig) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| EmentarioError::config(format!("invalid base url {base_url}: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EmentarioError::Source(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            query: query.to_string(),
            page: 1,
            rate_limit_ms: config.rate_limit_ms,
            min_body_len: config.min_body_len,
            bodies: HashMap::new(),
            has_next: false,
        })
    }

    /// Fetch and parse the current results page into cards.
    #[instrument(skip_all, fields(page = self.page, query = %self.query))]
    async fn fetch_current_page(&mut self) -> Result<Vec<RawCard>> {
        let response = self
            .client
            .get(self.base_url.as_str())
            .query(&[("q", self.query.as_str()), ("pagina", &self.page.to_string())])
            .send()
            .await
            .map_err(|e| EmentarioError::Source(format!("{}: {e}", self.base_url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmentarioError::Source(format!(
                "{}: HTTP {status}",
                self.base_url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EmentarioError::Source(format!("body read failed: {e}")))?;

        let doc = Html::parse_document(&body);
        self.has_next = detect_next_link(&doc);
        self.bodies.clear();

        let elements = select_cards(&doc);
        let mut cards = Vec::with_capacity(elements.len());
        let mut seen = 0usize;

        for element in elements {
            let text = collect_card_text(&element);
            if text.len() < self.min_body_len {
                debug!(len = text.len(), "skipping short card text");
                continue;
            }

            let ephemeral_id = element
                .value()
                .attr("id")
                .map(str::to_string)
                .unwrap_or_else(|| content_id(&text, seen));
            seen += 1;

            let header_lines = header_lines_of(&text);
            self.bodies.insert(ephemeral_id.clone(), text);
            cards.push(RawCard {
                ephemeral_id,
                header_lines,
            });
        }

        debug!(cards = cards.len(), has_next = self.has_next, "page parsed");
        Ok(cards)
    }
}

impl RecordSource for HtmlRecordSource {
    async fn fetch_cards(&mut self) -> Result<Vec<RawCard>> {
        self.fetch_current_page().await
    }

    async fn extract_body(&mut self, card: &RawCard) -> Result<String> {
        self.bodies
            .get(&card.ephemeral_id)
            .cloned()
            .ok_or_else(|| {
                warn!(card = %card.ephemeral_id, "card body missing from page cache");
                EmentarioError::ExtractionTimeout(card.ephemeral_id.clone())
            })
    }

    async fn advance(&mut self) -> Result<bool> {
        if !self.has_next {
            return Ok(false);
        }
        if self.rate_limit_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.rate_limit_ms)).await;
        }
        self.page += 1;
        Ok(true)
    }
}

/// Select result cards, trying each known selector until one matches.
fn select_cards(doc: &Html) -> Vec<ElementRef<'_>> {
    for selector_str in CARD_SELECTORS {
        let selector = Selector::parse(selector_str).unwrap();
        let elements: Vec<ElementRef<'_>> = doc.select(&selector).collect();
        if !elements.is_empty() {
            debug!(selector = selector_str, count = elements.len(), "cards matched");
            return elements;
        }
    }
    Vec::new()
}

/// Whether the page links to a further results page.
fn detect_next_link(doc: &Html) -> bool {
    let rel_next = Selector::parse("a[rel=next]").unwrap();
    if doc.select(&rel_next).next().is_some() {
        return true;
    }

    // Paginator button variant: present but disabled means last page.
    let paginator = Selector::parse(".p-paginator-next").unwrap();
    doc.select(&paginator).any(|el| {
        !el.value()
            .attr("class")
            .is_some_and(|c| c.contains("p-disabled"))
    })
}

/// A card's visible text, line-structured and trimmed.
fn collect_card_text(element: &ElementRef<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();
    for chunk in element.text() {
        for line in chunk.lines() {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
    }
    lines.join("\n")
}

/// The leading lines of a card, up to the body marker.
fn header_lines_of(text: &str) -> Vec<String> {
    text.lines()
        .take_while(|line| !line.to_lowercase().starts_with("ementa"))
        .take(MAX_HEADER_LINES)
        .map(str::to_string)
        .collect()
}

/// Content-derived card id for markup without element ids.
fn content_id(text: &str, position: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("card-{position}-{}", &digest[..16])
}

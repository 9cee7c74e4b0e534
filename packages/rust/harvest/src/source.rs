//! The record-source interface consumed by the traversal engine.
//!
//! A source surfaces raw "cards" for the current results page, hands back
//! the raw text blob for one card's body, and advances through pages. How
//! the cards are obtained (HTTP, a headless browser, a fixture) is the
//! source's business.

use ementario_shared::Result;

/// One raw record surfaced by the source, prior to normalization.
#[derive(Debug, Clone)]
pub struct RawCard {
    /// Page-scoped identity for the card. Stable only within one page
    /// render; never used across pages.
    pub ephemeral_id: String,
    /// Raw header lines, in display order.
    pub header_lines: Vec<String>,
}

/// A paginated source of raw record cards.
///
/// The source owns its page cursor: `fetch_cards` reads the current page,
/// `advance` moves the cursor and reports whether a further page exists.
pub trait RecordSource {
    /// Cards on the current page, in display order.
    async fn fetch_cards(&mut self) -> Result<Vec<RawCard>>;

    /// The raw body blob for one card.
    ///
    /// Fails with [`ementario_shared::EmentarioError::ExtractionTimeout`]
    /// when the copy mechanism does not deliver in time; the engine
    /// retries the same card once before counting a failed attempt.
    async fn extract_body(&mut self, card: &RawCard) -> Result<String>;

    /// Advance to the next page. `Ok(false)` means no further page.
    async fn advance(&mut self) -> Result<bool>;
}

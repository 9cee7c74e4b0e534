//! Layout oracle — resolves a bookmark name to its current page number.
//!
//! Safe to call repeatedly; answers get more accurate as more content is
//! appended to the document. "Not yet computable" is a normal outcome
//! (`None`), not an error.

/// Resolves bookmark names to page numbers in the laid-out document.
pub trait LayoutOracle {
    /// The page the bookmark currently falls on, or `None` while the
    /// layout cannot place it yet.
    fn resolve_page(&self, bookmark_name: &str) -> Option<u32>;
}

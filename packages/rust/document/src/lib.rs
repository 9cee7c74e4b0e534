//! Document-side state for a harvest run: the bookmark/section registry,
//! TOC reconciliation, the document sink, and the layout oracle.

pub mod oracle;
pub mod registry;
pub mod sink;
pub mod toc;

pub use oracle::LayoutOracle;
pub use registry::{SectionRegistry, sanitize_bookmark_name};
pub use sink::{DocumentSink, MarkdownDocument};
pub use toc::rebuild_toc;

//! Paginated record harvesting: the traversal engine, the record-source
//! interface, the HTTP-backed source, and cooperative cancellation.

pub mod cancel;
pub mod engine;
pub mod html;
pub mod source;

pub use cancel::CancellationToken;
pub use engine::{RunContext, SectionOutcome, TraversalEngine, TraversalLimits};
pub use html::HtmlRecordSource;
pub use source::{RawCard, RecordSource};

//! Harvest orchestration: run plans, the end-to-end pipeline, and
//! progress reporting.

pub mod pipeline;
pub mod plan;

pub use pipeline::{
    ProgressReporter, RunOptions, SearchTarget, SilentProgress, run_harvest, summary_path,
};
pub use plan::{default_plan, targets_from_specs};

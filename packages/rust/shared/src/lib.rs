//! Shared types, error model, and configuration for Ementário.
//!
//! This crate is the foundation depended on by all other Ementário crates.
//! It provides:
//! - [`EmentarioError`] — the unified error type
//! - Domain types ([`Entry`], [`Identifier`], [`Section`], [`TocLine`], [`RunId`])
//! - Configuration ([`AppConfig`], [`HarvestConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, HarvestConfig, HarvestPoliciesConfig, SearchConfig, config_dir,
    config_file_path, expand_tilde, init_config, load_config, load_config_from,
};
pub use error::{EmentarioError, Result};
pub use types::{Entry, HarvestSummary, Identifier, RunId, Section, TargetStats, TocLine};

//! Ementário CLI — jurisprudence harvesting into a single document.
//!
//! Traverses the paginated jurisprudence listing, classifies each record
//! by its organizational origin, and assembles a sectioned document with
//! a reconciled table of contents.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}

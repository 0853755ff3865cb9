//! docsplit CLI: split a documentation site into one document per section.
//!
//! Crawls everything reachable from a main URL, partitions the discovered
//! tree into sections and writes one merged Markdown artifact per section.

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

//! manualsync CLI: mirror a multi-page online manual as local Markdown.
//!
//! Discovers every chapter from the manual's table of contents, converts each
//! one to Markdown, writes per-chapter files plus a combined document, and
//! reports which chapters changed since the previous run.

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

//! labbook CLI: scrape the Web Security Academy labs into one document.
//!
//! Discovers every lab on the index page, archives each page locally and
//! assembles the lab write-ups into a single HTML file.

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

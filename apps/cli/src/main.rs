//! ratedeck CLI — influencer rate-card document generator.
//!
//! Turns a roster JSON file into a paginated, print-ready PDF rate card
//! with live profile snapshots.

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

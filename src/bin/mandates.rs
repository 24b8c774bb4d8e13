// src/bin/mandates.rs
use clap::Parser;
use mandate_scrape::cli::{self, ScrapeArgs};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli::run(ScrapeArgs::parse())
}

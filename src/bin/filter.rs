// src/bin/filter.rs
use clap::Parser;
use mandate_scrape::cli::{self, FilterArgs};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli::filter(FilterArgs::parse())
}

// src/bin/tidy.rs
use clap::Parser;
use mandate_scrape::cli::{self, TidyArgs};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli::tidy(TidyArgs::parse())
}

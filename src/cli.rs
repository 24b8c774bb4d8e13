// src/cli.rs
use std::io::{self, BufRead};
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use serde_json::Value;

use crate::config::{self, AppOptions};
use crate::filter::run_filter;
use crate::progress::ConsoleProgress;
use crate::scrape::{self, RunStatus, RunSummary};
use crate::session::{ChromeSession, Session};
use crate::store::Store;

const STORE_NOTE: &str = "Only one process may use a given store file at a time.";

/// Log in to the portal, walk the mandate listing once and append every new
/// mandate to the JSON store.
#[derive(Debug, Parser)]
#[command(name = "mandates", version, after_help = STORE_NOTE)]
pub struct ScrapeArgs {
    /// Config file (JSON). Defaults to config/config.json if present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run Chrome without a window.
    #[arg(long)]
    pub headless: bool,
}

/// Select the stored mandates that are still open and applied to on the portal.
#[derive(Debug, Parser)]
#[command(name = "mandates-filter", version)]
pub struct FilterArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD) instead of today.
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

/// Re-clean every value of an existing store in place.
#[derive(Debug, Parser)]
#[command(name = "mandates-tidy", version, after_help = STORE_NOTE)]
pub struct TidyArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn load_options(path: Option<&std::path::Path>) -> Result<AppOptions> {
    config::load(path).wrap_err("loading configuration")
}

pub fn run(args: ScrapeArgs) -> Result<()> {
    crate::log::init();
    let mut opts = load_options(args.config.as_deref())?;
    if args.headless {
        opts.browser.headless = true;
    }
    opts.require_credentials()?;

    let mut store = Store::load(&opts.store.mandates_file);
    let mut session = ChromeSession::start(&opts.browser).wrap_err("starting the browser")?;
    let mut progress = ConsoleProgress::new();

    let summary = scrape::run(&mut session, &opts, &mut store, &mut progress);
    print_run_summary(&summary, &store);

    if summary.status == RunStatus::Completed {
        println!("Type 'q' then Enter to close the browser.");
        wait_for_quit()?;
    }
    session.teardown();
    Ok(())
}

fn print_run_summary(summary: &RunSummary, store: &Store) {
    match summary.status {
        RunStatus::LoginFailed => {
            println!("Login failed. Check the credentials and the login URL.");
            return;
        }
        RunStatus::ListingUnavailable => {
            println!("Logged in, but the mandate listing never appeared.");
            return;
        }
        RunStatus::Completed => {}
    }
    let report = &summary.report;
    println!();
    println!("Listed:          {}", summary.listed);
    println!("Saved:           {}", report.saved.len());
    println!("  access denied: {}", report.access_denied());
    println!("Already stored:  {}", report.already_processed);
    println!("Failed:          {}", report.failed.len());
    for (code, reason) in &report.failed {
        println!("  {code}: {reason}");
    }
    println!("Store:           {} ({} records)", store.path().display(), store.len());
}

// Blocks until the operator types `q`. EOF counts as quit.
fn wait_for_quit() -> Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if line?.trim().eq_ignore_ascii_case("q") {
            break;
        }
    }
    Ok(())
}

pub fn filter(args: FilterArgs) -> Result<()> {
    crate::log::init();
    let opts = load_options(args.config.as_deref())?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let summary = run_filter(&opts.store.mandates_file, &opts.store.filtered_file, today)?;

    println!("Mandates in store:  {}", summary.total);
    println!("Kept:               {}", summary.kept.len());
    println!("  unreadable dates: {}", summary.unreadable_dates);
    println!("Access denied:      {}", summary.access_denied);
    println!("External channel:   {}", summary.external);
    println!("Expired:            {}", summary.expired);
    println!("Written to {}", opts.store.filtered_file.display());

    for record in &summary.kept {
        let field = |key: &str| record.get(key).and_then(Value::as_str).unwrap_or("").to_string();
        println!();
        println!("Code:       {}", field("code_mandat"));
        println!("Title:      {}", field("titre_mandat"));
        println!("Deadline:   {}", field("date_limite"));
        println!("Employer:   {}", field("employeur"));
    }
    Ok(())
}

pub fn tidy(args: TidyArgs) -> Result<()> {
    crate::log::init();
    let opts = load_options(args.config.as_deref())?;
    let mut store = Store::load(&opts.store.mandates_file);
    if store.is_empty() {
        println!("Nothing to tidy in {}", store.path().display());
        return Ok(());
    }
    let changed = store.renormalize()?;
    println!(
        "{changed} of {} record(s) cleaned in {}",
        store.len(),
        store.path().display()
    );
    Ok(())
}

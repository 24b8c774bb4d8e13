// src/scrape/pipeline.rs
use tracing::{info, warn};

use super::walker::{enumerate_rows, WalkReport, Walker};
use crate::config::AppOptions;
use crate::progress::Progress;
use crate::session::{authenticate, Session};
use crate::store::Store;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    LoginFailed,
    ListingUnavailable,
}

#[derive(Debug)]
pub struct RunSummary {
    pub status: RunStatus,
    /// Rows captured from the listing.
    pub listed: usize,
    pub report: WalkReport,
}

impl RunSummary {
    fn aborted(status: RunStatus) -> Self {
        Self {
            status,
            listed: 0,
            report: WalkReport::default(),
        }
    }
}

/// One full run: log in, capture the listing, walk every unseen row.
///
/// Never returns an error; every failure is folded into the summary.
pub fn run<S: Session + ?Sized>(
    session: &mut S,
    opts: &AppOptions,
    store: &mut Store,
    progress: &mut dyn Progress,
) -> RunSummary {
    let settings = &opts.settings;

    progress.log("Logging in…");
    let logged_in = authenticate(
        session,
        &opts.credentials,
        &opts.portal.login_url,
        &opts.login,
        settings.wait(),
        settings.poll(),
    );
    if !logged_in {
        progress.log("Login failed, nothing was scraped.");
        progress.finish();
        return RunSummary::aborted(RunStatus::LoginFailed);
    }

    let listing_url = opts.portal.listing_url();
    match session.current_url() {
        Ok(here) if here.starts_with(listing_url) => {}
        _ => {
            info!(url = listing_url, "opening the listing");
            if let Err(e) = session.goto(listing_url) {
                warn!(error = %e, "could not open the listing");
            }
        }
    }
    session.settle(settings.settle());

    let walker = Walker::new(opts);
    let (index_url, entries) = match enumerate_rows(session, walker.listing(), settings.wait()) {
        Ok(captured) => captured,
        Err(e) => {
            warn!(error = %e, "listing not available");
            progress.log("The listing did not load.");
            progress.finish();
            return RunSummary::aborted(RunStatus::ListingUnavailable);
        }
    };

    info!(rows = entries.len(), known = store.processed().len(), "listing captured");
    if settings.jobs_per_page > 0 && entries.len() == settings.jobs_per_page {
        warn!(
            rows = entries.len(),
            "listing is exactly one page long, later pages are not walked"
        );
    }

    let report = walker.walk(session, &index_url, &entries, store, progress);
    info!(
        saved = report.saved.len(),
        skipped = report.already_processed,
        failed = report.failed.len(),
        "walk finished"
    );
    progress.finish();

    RunSummary {
        status: RunStatus::Completed,
        listed: entries.len(),
        report,
    }
}

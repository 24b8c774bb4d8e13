// src/scrape/walker.rs
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AppOptions, Settings, VisitMode};
use crate::progress::Progress;
use crate::record::{Channel, ListingEntry, MandateRecord, Validity};
use crate::session::{Locator, Session, SessionError};
use crate::specs::detail::DetailParser;
use crate::specs::listing::{capture_entries, ListingRules};
use crate::store::{Store, StoreError};

/// Why a row produced no new record.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("already stored")]
    AlreadyProcessed,

    #[error("navigation failed: {0}")]
    Navigation(#[source] SessionError),

    #[error("extraction failed: {0}")]
    Extraction(#[source] SessionError),

    #[error("mandate {0} is already stored under the page code")]
    Duplicate(String),

    #[error("could not persist: {0}")]
    Persist(#[source] StoreError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Saved {
    pub code: String,
    pub validity: Validity,
    pub channel: Channel,
}

pub type RowOutcome = Result<Saved, SkipReason>;

#[derive(Debug, Default)]
pub struct WalkReport {
    pub saved: Vec<Saved>,
    pub already_processed: usize,
    /// `(listing code, reason)` for every row that failed.
    pub failed: Vec<(String, String)>,
}

impl WalkReport {
    pub fn record(&mut self, code: &str, outcome: RowOutcome) {
        match outcome {
            Ok(saved) => self.saved.push(saved),
            Err(SkipReason::AlreadyProcessed) => self.already_processed += 1,
            Err(reason) => self.failed.push((s!(code), reason.to_string())),
        }
    }

    pub fn rows(&self) -> usize {
        self.saved.len() + self.already_processed + self.failed.len()
    }

    pub fn access_denied(&self) -> usize {
        self.saved
            .iter()
            .filter(|s| s.validity == Validity::AccessDenied)
            .count()
    }
}

/// Wait for the listing, then capture every row before anything navigates.
/// Returns the index URL the rows were captured from.
pub fn enumerate_rows<S: Session + ?Sized>(
    session: &S,
    rules: &ListingRules,
    wait: Duration,
) -> Result<(String, Vec<ListingEntry>), SessionError> {
    session.wait_for(&rules.ready, wait)?;
    let index_url = session.current_url()?;
    let html = session.page_source()?;
    let entries = capture_entries(&html, &index_url, rules);
    debug!(url = %index_url, rows = entries.len(), "listing captured");
    Ok((index_url, entries))
}

/// Drives one pass over captured rows: visit, extract, persist, restore.
pub struct Walker {
    parser: DetailParser,
    listing: ListingRules,
    detail_ready: Option<Locator>,
    settings: Settings,
}

impl Walker {
    pub fn new(opts: &AppOptions) -> Self {
        Self {
            parser: DetailParser::new(&opts.detail),
            listing: opts.listing.clone(),
            detail_ready: opts.detail.ready.clone(),
            settings: opts.settings.clone(),
        }
    }

    pub fn listing(&self) -> &ListingRules {
        &self.listing
    }

    /// Process rows in order. One row's failure never stops the walk.
    pub fn walk<S: Session + ?Sized>(
        &self,
        session: &mut S,
        index_url: &str,
        entries: &[ListingEntry],
        store: &mut Store,
        progress: &mut dyn Progress,
    ) -> WalkReport {
        let mut report = WalkReport::default();
        progress.begin(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            debug!(n = i + 1, of = entries.len(), code = %entry.code, text = %entry.text, "row");
            let outcome = self.process_row(session, index_url, entry, store);
            match &outcome {
                Ok(saved) => {
                    info!(code = %saved.code, validity = ?saved.validity, channel = ?saved.channel, "mandate saved");
                    progress.item_done(&saved.code);
                }
                Err(SkipReason::AlreadyProcessed) => {
                    debug!(code = %entry.code, "already stored, skipped");
                    progress.item_skipped(&entry.code);
                }
                Err(reason) => {
                    warn!(code = %entry.code, %reason, "row skipped");
                    progress.item_failed(&entry.code, &reason.to_string());
                }
            }
            report.record(&entry.code, outcome);
        }
        report
    }

    pub fn process_row<S: Session + ?Sized>(
        &self,
        session: &mut S,
        index_url: &str,
        entry: &ListingEntry,
        store: &mut Store,
    ) -> RowOutcome {
        if store.contains(&entry.code) {
            return Err(SkipReason::AlreadyProcessed);
        }

        let outcome = match self.settings.visit_mode {
            VisitMode::NewView => match session.open_view(&entry.url) {
                Ok(()) => {
                    let outcome = self.extract_and_persist(session, entry, store);
                    if let Err(e) = session.close_view() {
                        warn!(error = %e, "could not close the detail view");
                    }
                    outcome
                }
                Err(e) => Err(SkipReason::Navigation(e)),
            },
            VisitMode::SameView => {
                let outcome = self
                    .goto_detail(session, entry)
                    .and_then(|()| self.extract_and_persist(session, entry, store));
                if let Err(e) = session.goto(index_url) {
                    warn!(error = %e, url = index_url, "could not navigate back to the listing");
                }
                outcome
            }
        };

        self.restore_listing(session);
        outcome
    }

    fn goto_detail<S: Session + ?Sized>(&self, session: &mut S, entry: &ListingEntry) -> Result<(), SkipReason> {
        session.goto(&entry.url).map_err(SkipReason::Navigation)?;
        session.settle(self.settings.settle());
        let landed = session.current_url().map_err(SkipReason::Navigation)?;
        let marker = format!("{}=", self.listing.id_param);
        if landed.contains(&marker) {
            Ok(())
        } else {
            Err(SkipReason::Navigation(SessionError::Navigation {
                url: entry.url.clone(),
                reason: format!("landed on {landed}"),
            }))
        }
    }

    fn extract_and_persist<S: Session + ?Sized>(
        &self,
        session: &mut S,
        entry: &ListingEntry,
        store: &mut Store,
    ) -> RowOutcome {
        let record = self.extract(session, entry)?;
        persist(store, &record)?;
        Ok(Saved {
            code: record.code,
            validity: record.validity,
            channel: record.channel,
        })
    }

    fn extract<S: Session + ?Sized>(&self, session: &S, entry: &ListingEntry) -> Result<MandateRecord, SkipReason> {
        session.settle(self.settings.settle());
        if let Some(ready) = &self.detail_ready {
            // Denied pages may never show it; extract what is there.
            if let Err(e) = session.wait_for(ready, self.settings.wait()) {
                debug!(error = %e, "detail ready marker missing");
            }
        }
        let html = session.page_source().map_err(SkipReason::Extraction)?;
        let url = session.current_url().unwrap_or_else(|_| entry.url.clone());
        Ok(self.parser.extract_html(&html, entry, &url, Utc::now()))
    }

    fn restore_listing<S: Session + ?Sized>(&self, session: &S) {
        session.settle(self.settings.settle());
        if let Err(e) = session.wait_for(&self.listing.ready, self.settings.wait()) {
            warn!(error = %e, "listing did not come back after the visit");
        }
    }
}

fn persist(store: &mut Store, record: &MandateRecord) -> Result<(), SkipReason> {
    store.append(record).map_err(|e| match e {
        StoreError::Duplicate { code } => SkipReason::Duplicate(code),
        other => SkipReason::Persist(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ScriptedSession;

    const INDEX: &str = "https://portal.example/mandats";

    fn listing(rows: &[(&str, &str)]) -> String {
        let rows: String = rows
            .iter()
            .map(|(code, text)| format!(r#"<tr><td><a href="/detail?mandat={code}">{text}</a></td></tr>"#))
            .collect();
        format!(r#"<html><body><table class="mandats">{rows}</table></body></html>"#)
    }

    fn detail(code: &str) -> String {
        format!(r#"<html><body><p><span>Code du mandat:</span><span>{code}</span></p></body></html>"#)
    }

    fn walker(mode: VisitMode) -> Walker {
        let mut opts = AppOptions::default();
        opts.settings.visit_mode = mode;
        Walker::new(&opts)
    }

    #[test]
    fn enumerate_needs_the_listing() {
        let mut session = ScriptedSession::new().with_page(INDEX, "<p>maintenance</p>");
        session.goto(INDEX).unwrap();
        let err = enumerate_rows(&session, &ListingRules::default(), Duration::ZERO).unwrap_err();
        assert!(matches!(err, SessionError::NotFound { .. }));
    }

    #[test]
    fn same_view_verifies_landing_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::load(dir.path().join("mandats.json"));
        let mut session = ScriptedSession::new().with_page(INDEX, &listing(&[("5", "Stage")]));
        session.goto(INDEX).unwrap();

        // Link points at a page without the mandate marker.
        let entry = ListingEntry {
            code: s!("5"),
            url: s!("https://portal.example/home"),
            text: s!("Stage"),
        };
        let outcome = walker(VisitMode::SameView).process_row(&mut session, INDEX, &entry, &mut store);
        assert!(matches!(outcome, Err(SkipReason::Navigation(_))));
        assert_eq!(session.current_url().unwrap(), INDEX);
        assert!(store.is_empty());
    }

    #[test]
    fn page_code_already_stored_is_a_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::load(dir.path().join("mandats.json"));
        store
            .append(&MandateRecord { code: s!("900"), ..MandateRecord::default() })
            .unwrap();

        let url = "https://portal.example/detail?mandat=42";
        let mut session = ScriptedSession::new()
            .with_page(INDEX, &listing(&[("42", "Stage")]))
            .with_page(url, &detail("900"));
        session.goto(INDEX).unwrap();

        let entry = ListingEntry { code: s!("42"), url: s!(url), text: s!("Stage") };
        let outcome = walker(VisitMode::NewView).process_row(&mut session, INDEX, &entry, &mut store);
        assert!(matches!(outcome, Err(SkipReason::Duplicate(code)) if code == "900"));
        assert_eq!(store.len(), 1);
        assert_eq!(session.open_views(), 1);
    }

    #[test]
    fn report_counts() {
        let mut report = WalkReport::default();
        report.record("1", Err(SkipReason::AlreadyProcessed));
        report.record("2", Ok(Saved { code: s!("2"), validity: Validity::AccessDenied, channel: Channel::External }));
        report.record("3", Err(SkipReason::Duplicate(s!("3"))));
        assert_eq!(report.rows(), 3);
        assert_eq!(report.already_processed, 1);
        assert_eq!(report.access_denied(), 1);
        assert_eq!(report.failed.len(), 1);
    }
}

// src/filter.rs
//! Post-run selection: which stored mandates are worth applying to.
//!
//! Reads the store, never writes it. The survivors go to a separate file
//! consumed by the letter tooling.

use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::consts::ACCESS_DENIED_STATUS;
use crate::file::write_atomic;
use crate::store::{code_of, snapshot, StoreError};

const DATE_FORMATS: [&str; 2] = ["%d-%m-%Y", "%Y-%m-%d"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    AccessDenied,
    External,
    Expired,
}

#[derive(Debug, Default)]
pub struct FilterSummary {
    pub total: usize,
    pub kept: Vec<Value>,
    pub access_denied: usize,
    pub external: usize,
    pub expired: usize,
    /// Kept despite a deadline that could not be read.
    pub unreadable_dates: usize,
}

fn text<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("").trim()
}

pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Classify one stored record. A deadline of `today` is still open.
pub fn verdict(record: &Value, today: NaiveDate) -> Verdict {
    if text(record, "etat_mandat") == ACCESS_DENIED_STATUS || text(record, "validite") == "access-denied" {
        return Verdict::AccessDenied;
    }
    if text(record, "postulation_laruche") != "Oui" {
        return Verdict::External;
    }
    match parse_deadline(text(record, "date_limite")) {
        Some(deadline) if deadline < today => Verdict::Expired,
        _ => Verdict::Keep,
    }
}

pub fn filter_records(records: &[Value], today: NaiveDate) -> FilterSummary {
    let mut summary = FilterSummary {
        total: records.len(),
        ..FilterSummary::default()
    };
    for record in records {
        match verdict(record, today) {
            Verdict::Keep => {
                let raw = text(record, "date_limite");
                if !raw.is_empty() && parse_deadline(raw).is_none() {
                    warn!(code = ?code_of(record), date = raw, "unreadable deadline, keeping the mandate");
                    summary.unreadable_dates += 1;
                }
                summary.kept.push(record.clone());
            }
            Verdict::AccessDenied => summary.access_denied += 1,
            Verdict::External => summary.external += 1,
            Verdict::Expired => summary.expired += 1,
        }
    }
    summary
}

/// Filter the store at `source` into `target`.
pub fn run_filter(source: &Path, target: &Path, today: NaiveDate) -> Result<FilterSummary, StoreError> {
    let records = snapshot(source);
    let summary = filter_records(&records, today);
    let bytes = serde_json::to_vec_pretty(&summary.kept)?;
    write_atomic(target, &bytes).map_err(|source| StoreError::Io {
        path: target.to_path_buf(),
        source,
    })?;
    info!(
        total = summary.total,
        kept = summary.kept.len(),
        target = %target.display(),
        "filtered mandates written"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    fn open(date: &str) -> Value {
        json!({ "code_mandat": "1", "postulation_laruche": "Oui", "date_limite": date })
    }

    #[test]
    fn keeps_open_native_mandates() {
        assert_eq!(verdict(&open("20-10-2026"), today()), Verdict::Keep);
        assert_eq!(verdict(&open("15-10-2026"), today()), Verdict::Keep);
        assert_eq!(verdict(&open("2026-11-01"), today()), Verdict::Keep);
        assert_eq!(verdict(&open(""), today()), Verdict::Keep);
    }

    #[test]
    fn drops_expired_external_and_denied() {
        assert_eq!(verdict(&open("14-10-2026"), today()), Verdict::Expired);
        let external = json!({ "code_mandat": "2", "postulation_laruche": "Non", "date_limite": "01-01-2030" });
        assert_eq!(verdict(&external, today()), Verdict::External);
        let legacy = json!({ "code_mandat": "3", "date_limite": "01-01-2030" });
        assert_eq!(verdict(&legacy, today()), Verdict::External);
        let denied = json!({ "code_mandat": "4", "etat_mandat": ACCESS_DENIED_STATUS, "postulation_laruche": "Oui" });
        assert_eq!(verdict(&denied, today()), Verdict::AccessDenied);
    }

    #[test]
    fn unreadable_dates_are_kept_and_counted() {
        let records = vec![open("fin novembre"), open("01-01-2020")];
        let summary = filter_records(&records, today());
        assert_eq!(summary.kept.len(), 1);
        assert_eq!(summary.unreadable_dates, 1);
        assert_eq!(summary.expired, 1);
    }
}

// tests/filter.rs
use std::fs;

use chrono::NaiveDate;
use serde_json::{json, Value};

use mandate_scrape::filter::run_filter;

#[test]
fn writes_only_open_native_mandates() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("mandats.json");
    let target = dir.path().join("out").join("mandats_filtered.json");
    let records = json!([
        { "code_mandat": "1", "postulation_laruche": "Oui", "date_limite": "01-12-2026", "employeur": "Acme" },
        { "code_mandat": "2", "postulation_laruche": "Oui", "date_limite": "01-01-2026" },
        { "code_mandat": "3", "postulation_laruche": "Non", "date_limite": "01-12-2026" },
        { "code_mandat": "4", "etat_mandat": "Non valide - Accès refusé", "validite": "access-denied" },
        { "code_mandat": "5", "postulation_laruche": "Oui", "date_limite": "bientôt" }
    ]);
    fs::write(&source, records.to_string()).unwrap();
    let before = fs::read_to_string(&source).unwrap();

    let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
    let summary = run_filter(&source, &target, today).unwrap();

    assert_eq!(summary.total, 5);
    assert_eq!(summary.kept.len(), 2);
    assert_eq!((summary.expired, summary.external, summary.access_denied), (1, 1, 1));
    assert_eq!(summary.unreadable_dates, 1);

    let written: Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    let codes: Vec<_> = written
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["code_mandat"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, ["1", "5"]);
    // The store itself is never touched.
    assert_eq!(fs::read_to_string(&source).unwrap(), before);
}

#[test]
fn missing_store_writes_an_empty_selection() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("mandats_filtered.json");
    let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

    let summary = run_filter(&dir.path().join("absent.json"), &target, today).unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(fs::read_to_string(&target).unwrap().trim(), "[]");
}

#[test]
fn malformed_store_is_read_without_side_files() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("mandats.json");
    let target = dir.path().join("mandats_filtered.json");
    fs::write(&source, "[{\"code_mandat\": ").unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

    let summary = run_filter(&source, &target, today).unwrap();
    assert_eq!(summary.total, 0);

    let mut names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["mandats.json", "mandats_filtered.json"]);
}

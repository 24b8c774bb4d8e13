// tests/store_roundtrip.rs
use std::fs;

use serde_json::json;

use mandate_scrape::record::{MandateRecord, Validity};
use mandate_scrape::store::{Store, StoreError};

#[test]
fn entities_and_mojibake_are_repaired_and_stay_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mandats.json");

    let mut store = Store::load(&path);
    store
        .append(&MandateRecord {
            code: "55".into(),
            title: "Stage en R&amp;D &#8211; logiciel".into(),
            employer: "Ã‰cole Polytechnique".into(),
            description: "Travail d\u{2019}Ã©quipe\u{0}\r\n  en   labo".into(),
            validity: Validity::Valid,
            ..MandateRecord::default()
        })
        .unwrap();

    let first = fs::read_to_string(&path).unwrap();
    let mut reloaded = Store::load(&path);
    let record = &reloaded.records()[0];
    assert_eq!(record["titre_mandat"], json!("Stage en R&D – logiciel"));
    assert_eq!(record["employeur"], json!("École Polytechnique"));
    assert_eq!(record["description_mandat"], json!("Travail d\u{2019}Ã©quipe en labo"));

    // load → renormalize → save cycles change nothing further.
    assert_eq!(reloaded.renormalize().unwrap(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
    let mut again = Store::load(&path);
    assert_eq!(again.renormalize().unwrap(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn renormalize_cleans_legacy_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mandats.json");
    let legacy = json!([
        { "code_mandat": "1", "titre_mandat": "  Ing&eacute;nieur   junior ", "specialites": ["GÃ©nie", "Logiciel"] },
        { "code_mandat": "2", "titre_mandat": "Propre", "duree": 4 }
    ]);
    fs::write(&path, serde_json::to_string_pretty(&legacy).unwrap()).unwrap();

    let mut store = Store::load(&path);
    assert_eq!(store.renormalize().unwrap(), 1);

    let reloaded = Store::load(&path);
    assert_eq!(reloaded.records()[0]["titre_mandat"], json!("Ingénieur junior"));
    assert_eq!(reloaded.records()[0]["specialites"], json!(["Génie", "Logiciel"]));
    assert_eq!(reloaded.records()[1]["duree"], json!(4));
    assert!(reloaded.contains("1") && reloaded.contains("2"));
}

#[test]
fn store_is_last_line_of_defense_against_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mandats.json");
    fs::write(&path, r#"[{ "id": 77, "titre": "ancien format" }]"#).unwrap();

    let mut store = Store::load(&path);
    let dup = MandateRecord { code: " 77 ".into(), ..MandateRecord::default() };
    assert!(matches!(store.append(&dup), Err(StoreError::Duplicate { code }) if code == "77"));
    assert_eq!(Store::load(&path).len(), 1);
}

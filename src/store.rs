// src/store.rs
//! Append-only JSON store of mandate records plus its duplicate index.
//!
//! The file is a single pretty-printed JSON array, rewritten whole on every
//! append. Records already on disk are kept as raw [`Value`]s so stores
//! written by older tooling (other keys, numeric codes) survive untouched.

use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::sanitize::{normalize, normalize_value};
use crate::file::{backup_copy, write_atomic};
use crate::record::MandateRecord;

/// Keys that have held the mandate code over the store's history.
pub const CODE_KEYS: [&str; 3] = ["code_mandat", "code", "id"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not write {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("could not serialize records: {0}")]
    Json(#[from] serde_json::Error),

    #[error("mandate {code} is already stored")]
    Duplicate { code: String },

    #[error("record has no mandate code")]
    MissingCode,
}

/// Identifiers already persisted. Only [`Store`] mutates it.
#[derive(Debug, Default)]
pub struct ProcessedSet(HashSet<String>);

impl ProcessedSet {
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    fn insert(&mut self, code: String) -> bool {
        self.0.insert(code)
    }
}

#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    records: Vec<Value>,
    processed: ProcessedSet,
}

/// Mandate code of a stored record, whichever legacy key carries it.
pub fn code_of(record: &Value) -> Option<String> {
    CODE_KEYS.iter().find_map(|key| match record.get(key)? {
        Value::String(s) => Some(normalize(s)).filter(|c| !c.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

impl Store {
    /// Open the store at `path`. Never fails: an absent file is an empty
    /// store, and an unreadable or malformed one is backed up, logged and
    /// treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = read_records(&path);
        let mut processed = ProcessedSet::default();
        for record in &records {
            match code_of(record) {
                Some(code) => {
                    if !processed.insert(code.clone()) {
                        warn!(code = %code, "store already holds this code twice");
                    }
                }
                None => debug!("stored record without a code"),
            }
        }
        info!(path = %path.display(), records = records.len(), known = processed.len(), "store loaded");
        Self { path, records, processed }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.processed.contains(code)
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    /// Normalize and persist one record.
    ///
    /// The code enters the processed set only once the file is on disk; a
    /// failed write also drops the in-memory copy so the two never diverge.
    pub fn append(&mut self, record: &MandateRecord) -> Result<(), StoreError> {
        let mut record = record.clone();
        record.normalize_in_place();
        let code = record.code.clone();
        if code.is_empty() {
            return Err(StoreError::MissingCode);
        }
        if self.processed.contains(&code) {
            return Err(StoreError::Duplicate { code });
        }

        let value = normalize_value(serde_json::to_value(&record)?);
        self.records.push(value);
        if let Err(e) = self.save() {
            self.records.pop();
            return Err(e);
        }
        self.processed.insert(code);
        Ok(())
    }

    /// Re-clean every stored value and rewrite the file. Returns how many
    /// records changed. Idempotent.
    pub fn renormalize(&mut self) -> Result<usize, StoreError> {
        let cleaned: Vec<Value> = self.records.iter().cloned().map(normalize_value).collect();
        let changed = cleaned
            .iter()
            .zip(&self.records)
            .filter(|(new, old)| new != old)
            .count();

        let bytes = serde_json::to_vec_pretty(&cleaned)?;
        self.write(&bytes)?;
        self.records = cleaned;

        let mut processed = ProcessedSet::default();
        for code in self.records.iter().filter_map(code_of) {
            processed.insert(code);
        }
        self.processed = processed;
        info!(changed, total = self.records.len(), "store re-normalized");
        Ok(changed)
    }

    fn save(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&self.records)?;
        self.write(&bytes)
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
        write_atomic(&self.path, bytes).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Records of the store at `path` without opening it for writing. A
/// malformed file is logged and reads as empty; nothing is written beside it.
pub fn snapshot(path: &Path) -> Vec<Value> {
    parse_records(path).unwrap_or_else(|reason| {
        warn!(path = %path.display(), reason = %reason, "store unusable, reading it as empty");
        Vec::new()
    })
}

fn read_records(path: &Path) -> Vec<Value> {
    parse_records(path).unwrap_or_else(|reason| {
        set_aside(path, &reason);
        Vec::new()
    })
}

// `Err` carries the reason the file content is unusable.
fn parse_records(path: &Path) -> Result<Vec<Value>, String> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no store yet, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "store unreadable, starting empty");
            return Ok(Vec::new());
        }
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(_) => Err(s!("store is not a JSON array")),
        Err(e) => Err(format!("store is not valid JSON ({e})")),
    }
}

// The next append rewrites the file, so keep the bad bytes around first.
fn set_aside(path: &Path, reason: &str) {
    let suffix = format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S"));
    match backup_copy(path, &suffix) {
        Ok(backup) => warn!(reason, backup = %backup.display(), "starting with an empty store"),
        Err(e) => warn!(reason, error = %e, "starting with an empty store, backup failed"),
    }
}

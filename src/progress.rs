// src/progress.rs
use std::io::{self, Write};

/// Lightweight progress reporting for the listing walk.
/// Frontends implement this to surface status to the operator; the structured
/// log goes through `tracing` regardless.
pub trait Progress {
    /// Called at the start with the number of captured rows.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// A row was extracted and persisted.
    fn item_done(&mut self, _code: &str) {}

    /// A row was skipped on purpose (already stored).
    fn item_skipped(&mut self, _code: &str) {}

    /// A row failed and was skipped.
    fn item_failed(&mut self, _code: &str, _reason: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Plain console lines on stdout, e.g. `[3/42] 1234 saved`.
#[derive(Default)]
pub struct ConsoleProgress {
    total: usize,
    seen: usize,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&mut self, code: &str, what: &str) {
        self.seen += 1;
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "[{}/{}] {code} {what}", self.seen, self.total);
    }
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.seen = 0;
        println!("{total} mandate(s) on the listing");
    }

    fn log(&mut self, msg: &str) {
        println!("{msg}");
    }

    fn item_done(&mut self, code: &str) {
        self.line(code, "saved");
    }

    fn item_skipped(&mut self, code: &str) {
        self.line(code, "already stored");
    }

    fn item_failed(&mut self, code: &str, reason: &str) {
        self.line(code, &format!("skipped: {reason}"));
    }

    fn finish(&mut self) {
        println!("done ({} row(s) handled)", self.seen);
    }
}

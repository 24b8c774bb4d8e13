// src/scrape/mod.rs
pub mod pipeline;
pub mod walker;

pub use pipeline::{run, RunStatus, RunSummary};
pub use walker::{enumerate_rows, RowOutcome, Saved, SkipReason, WalkReport, Walker};

// src/specs/mod.rs
//! # Page “specs” module
//!
//! Page-specific knowledge of the portal: **where the ground truth lives in
//! the HTML** and **how to extract it robustly** from a snapshot.
//!
//! ## What lives here
//! - **Pure HTML parsing** over `scraper` documents taken from the live view
//!   (`Session::page_source`). Nothing here talks to the browser.
//! - **Locator and selector defaults** as plain data (`ListingRules`,
//!   `DetailRules`), so a portal redesign is a config change, not a rebuild.
//! - **Label-driven field lookup** (`fields`): a table of JSON key → page
//!   label with an ordered list of lookup strategies.
//!
//! ## What does **not** live here
//! - **Navigation, waits and view handling**: that’s `scrape::walker`.
//! - **Persistence and dedup**: `store`.
//!
//! ## Typical call chain
//! ```text
//! scrape::pipeline → walker::enumerate_rows → listing::capture_entries
//!                  → walker (per row)       → detail::DetailParser::extract
//!                                           ↘ store::Store::append
//! ```
//!
//! ## Conventions & invariants
//! - Every extracted string goes through `core::sanitize::normalize`.
//! - Missing elements give empty strings, never errors.
//! - Specs are testable **offline** against captured fixtures.
pub mod detail;
pub mod fields;
pub mod listing;

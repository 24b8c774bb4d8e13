// src/lib.rs

#[macro_use]
pub mod macros;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod specs;

pub mod file;
pub mod filter;
pub mod log;
pub mod progress;
pub mod record;
pub mod scrape;
pub mod session;
pub mod store;

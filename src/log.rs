// src/log.rs
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::consts::{DEBUG_LOG_FILE, DEFAULT_LOG_FILTER, LOG_ENV, STORE_DIR};
use crate::file::ensure_directory;

static START: OnceLock<Instant> = OnceLock::new();

fn start() -> Instant {
    *START.get_or_init(Instant::now)
}

fn fmt_elapsed(ms: u128) -> String {
    let total_ms = ms as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// Time since the first log line, `HH:MM:SS.mmm`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uptime;

impl FormatTime for Uptime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "[{}]", fmt_elapsed(start().elapsed().as_millis()))
    }
}

pub fn debug_log_path() -> PathBuf {
    Path::new(STORE_DIR).join(DEBUG_LOG_FILE)
}

fn open_debug_log(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Install the global subscriber: console on stderr plus an appending
/// plain-text copy in `.store/debug.log`. The filter comes from
/// `MANDATES_LOG` (defaults to `info`). Calling it twice is harmless.
pub fn init() {
    start();
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(Uptime)
        .with_target(false);

    let file = open_debug_log(&debug_log_path()).map(|f| {
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(f))
            .with_timer(Uptime)
            .with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();
}

// src/config/consts.rs

// Portal
pub const DEFAULT_LOGIN_URL: &str =
    "https://laruche.polymtl.ca/sp/ssp/r/etudiant/recherche-mandats?p40_type_recherche=C";
pub const MANDATE_PARAM: &str = "mandat";
pub const ACCESS_DENIED_STATUS: &str = "Non valide - Accès refusé";

// Local files
pub const STORE_DIR: &str = ".store";
pub const DEBUG_LOG_FILE: &str = "debug.log";
pub const DEFAULT_CONFIG_FILE: &str = "config/config.json";
pub const DEFAULT_MANDATES_FILE: &str = "mandats.json";
pub const DEFAULT_FILTERED_FILE: &str = "mandats_filtered.json";

// Timing
pub const WAIT_SECS: u64 = 10;
pub const SETTLE_MS: u64 = 3_000; // client-side rendering after clicks/navigations
pub const POLL_MS: u64 = 250;
pub const JOBS_PER_PAGE: usize = 50;

// Browser
pub const WINDOW_W: u32 = 1920;
pub const WINDOW_H: u32 = 1080;
pub const IDLE_BROWSER_SECS: u64 = 60 * 60 * 24 * 365; // effectively never

// Logging
pub const LOG_ENV: &str = "MANDATES_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

// Environment overrides
pub const ENV_USERNAME: &str = "PORTAL_USERNAME";
pub const ENV_PASSWORD: &str = "PORTAL_PASSWORD";
pub const ENV_LOGIN_URL: &str = "PORTAL_LOGIN_URL";
pub const ENV_LISTING_URL: &str = "PORTAL_LISTING_URL";

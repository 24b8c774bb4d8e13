// src/config/options.rs
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::consts::*;
use crate::session::LoginLocators;
use crate::specs::detail::DetailRules;
use crate::specs::listing::ListingRules;

/// Everything a run needs. Every section falls back to its defaults, so a
/// config file only has to carry what differs (usually just credentials).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppOptions {
    pub credentials: Credentials,
    pub portal: PortalOptions,
    pub settings: Settings,
    pub browser: BrowserOptions,
    pub store: StoreOptions,
    pub login: LoginLocators,
    pub listing: ListingRules,
    pub detail: DetailRules,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

// Keep the password out of logs and panics.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalOptions {
    /// Page that triggers the SSO login and lands on the listing afterwards.
    pub login_url: String,
    /// Listing page; `None` means the login URL doubles as the listing.
    pub listing_url: Option<String>,
}

impl Default for PortalOptions {
    fn default() -> Self {
        Self {
            login_url: s!(DEFAULT_LOGIN_URL),
            listing_url: None,
        }
    }
}

impl PortalOptions {
    pub fn listing_url(&self) -> &str {
        self.listing_url.as_deref().unwrap_or(&self.login_url)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitMode {
    /// Navigate the index view itself, then navigate back.
    SameView,
    /// Open each detail in a new tab and close it afterwards.
    #[default]
    NewView,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub wait_secs: u64,
    pub settle_ms: u64,
    pub poll_ms: u64,
    pub jobs_per_page: usize,
    pub visit_mode: VisitMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wait_secs: WAIT_SECS,
            settle_ms: SETTLE_MS,
            poll_ms: POLL_MS,
            jobs_per_page: JOBS_PER_PAGE,
            visit_mode: VisitMode::default(),
        }
    }
}

impl Settings {
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: WINDOW_W,
            window_height: WINDOW_H,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub mandates_file: PathBuf,
    pub filtered_file: PathBuf,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            mandates_file: PathBuf::from(DEFAULT_MANDATES_FILE),
            filtered_file: PathBuf::from(DEFAULT_FILTERED_FILE),
        }
    }
}

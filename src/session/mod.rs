// src/session/mod.rs
//! The browser seam. Everything that drives the portal goes through
//! [`Session`], so the walker can run against a real Chrome or a scripted
//! in-memory site.

pub mod chrome;
pub mod scripted;

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Credentials;

pub use chrome::ChromeSession;
pub use scripted::{ScriptedLogin, ScriptedSession};

/// How to find an element on the live page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    Css(String),
    Xpath(String),
}

impl Locator {
    pub fn css(s: &str) -> Self {
        Locator::Css(s!(s))
    }
    pub fn xpath(s: &str) -> Self {
        Locator::Xpath(s!(s))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css:{s}"),
            Locator::Xpath(s) => write!(f, "xpath:{s}"),
        }
    }
}

/// Login form locators. Defaults match the portal's SSO form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginLocators {
    pub username: Locator,
    pub password: Locator,
    pub submit: Locator,
    /// Panel the SSO page fills with a message when login is rejected.
    pub error_panel: Option<Locator>,
}

impl Default for LoginLocators {
    fn default() -> Self {
        Self {
            username: Locator::css("#username"),
            password: Locator::css("#password"),
            submit: Locator::css("button[name='submit']"),
            error_panel: Some(Locator::css(".errors")),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not launch browser: {0}")]
    Launch(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("element {locator} not found: {reason}")]
    NotFound { locator: Locator, reason: String },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("session already closed")]
    Closed,

    #[error("{0} is not supported by this session")]
    Unsupported(&'static str),
}

/// A single browser window with at most one auxiliary view (tab) on top of
/// the index view.
///
/// All reads (`current_url`, `page_source`, `wait_for`, `text_of`) address
/// the active view: the auxiliary one when open, else the index view.
pub trait Session {
    fn goto(&mut self, url: &str) -> Result<(), SessionError>;

    fn current_url(&self) -> Result<String, SessionError>;

    /// Serialized DOM of the active view.
    fn page_source(&self) -> Result<String, SessionError>;

    /// Block until `locator` is present or `timeout` elapses.
    fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<(), SessionError>;

    /// Clear the field, then type `text`.
    fn fill(&mut self, locator: &Locator, text: &str, timeout: Duration) -> Result<(), SessionError>;

    fn click(&mut self, locator: &Locator, timeout: Duration) -> Result<(), SessionError>;

    /// Visible text of the first match, if present right now.
    fn text_of(&self, locator: &Locator) -> Option<String>;

    /// Open `url` in a new view and make it active. On error no view is
    /// left open.
    fn open_view(&mut self, url: &str) -> Result<(), SessionError>;

    /// Close the auxiliary view and return to the index view.
    fn close_view(&mut self) -> Result<(), SessionError>;

    /// Give client-side rendering time to finish.
    fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    /// Release the browser. Safe to call more than once.
    fn teardown(&mut self);
}

/// Log in through the SSO form at `login_url`.
///
/// Success means the URL changed away from the login page within `timeout`.
/// Never errors: every failure is logged and reported as `false`.
pub fn authenticate<S: Session + ?Sized>(
    session: &mut S,
    credentials: &Credentials,
    login_url: &str,
    locators: &LoginLocators,
    timeout: Duration,
    poll: Duration,
) -> bool {
    match try_authenticate(session, credentials, login_url, locators, timeout, poll) {
        Ok(true) => {
            info!(user = %credentials.username, "logged in");
            true
        }
        Ok(false) => {
            let reason = locators
                .error_panel
                .as_ref()
                .and_then(|panel| session.text_of(panel))
                .map(|t| crate::core::normalize(&t))
                .filter(|t| !t.is_empty());
            match reason {
                Some(msg) => warn!(message = %msg, "login rejected"),
                None => warn!(timeout_s = timeout.as_secs(), "login timed out, still on the login page"),
            }
            false
        }
        Err(e) => {
            warn!(error = %e, "login failed");
            false
        }
    }
}

fn try_authenticate<S: Session + ?Sized>(
    session: &mut S,
    credentials: &Credentials,
    login_url: &str,
    locators: &LoginLocators,
    timeout: Duration,
    poll: Duration,
) -> Result<bool, SessionError> {
    session.goto(login_url)?;
    // The SSO redirect lands on a different URL than the one requested.
    let before = session.current_url()?;
    debug!(url = %before, "login form reached");

    session.fill(&locators.username, &credentials.username, timeout)?;
    session.fill(&locators.password, &credentials.password, timeout)?;
    session.click(&locators.submit, timeout)?;

    let deadline = Instant::now() + timeout;
    loop {
        let now = session.current_url()?;
        if now != before {
            debug!(url = %now, "left the login page");
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        thread::sleep(poll);
    }
}

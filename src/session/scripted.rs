// src/session/scripted.rs
// In-memory portal for tests and dry runs: a map of URL -> HTML, an optional
// scripted login, and a log of every navigation.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use scraper::Html;

use super::{Locator, Session, SessionError};
use crate::core::html::{selector, text_content};

/// Login behaviour: clicking submit on `url` with the right typed values
/// moves the view to `landing`.
#[derive(Clone, Debug)]
pub struct ScriptedLogin {
    pub url: String,
    pub landing: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default)]
pub struct ScriptedSession {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    login: Option<ScriptedLogin>,
    // index view first, auxiliary view (if any) on top
    views: Vec<String>,
    typed: HashMap<Locator, String>,
    visits: Vec<String>,
    closed: bool,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self {
            views: vec![s!("about:blank")],
            ..Self::default()
        }
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(s!(url), s!(html));
        self
    }

    /// Navigations to `url` fail with a navigation error.
    pub fn with_failing(mut self, url: &str) -> Self {
        self.failing.insert(s!(url));
        self
    }

    pub fn with_login(mut self, login: ScriptedLogin) -> Self {
        self.login = Some(login);
        self
    }

    /// Replace a page after construction (e.g. between two runs).
    pub fn set_page(&mut self, url: &str, html: &str) {
        self.pages.insert(s!(url), s!(html));
    }

    /// Every URL navigated to, in order, across all views.
    pub fn visits(&self) -> &[String] {
        &self.visits
    }

    pub fn visit_count(&self, url: &str) -> usize {
        self.visits.iter().filter(|v| v.as_str() == url).count()
    }

    pub fn open_views(&self) -> usize {
        self.views.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn active(&self) -> Result<&str, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        self.views.last().map(String::as_str).ok_or(SessionError::Closed)
    }

    fn source_of(&self, url: &str) -> String {
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| s!("<html><body></body></html>"))
    }

    fn load(&mut self, url: &str) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        self.visits.push(s!(url));
        if self.failing.contains(url) {
            return Err(SessionError::Navigation {
                url: s!(url),
                reason: s!("net::ERR_CONNECTION_RESET"),
            });
        }
        Ok(())
    }

    fn find(&self, locator: &Locator) -> Result<Option<String>, SessionError> {
        let css = match locator {
            Locator::Css(css) => css,
            Locator::Xpath(_) => return Err(SessionError::Unsupported("xpath")),
        };
        let Some(sel) = selector(css) else {
            return Ok(None);
        };
        let doc = Html::parse_document(&self.source_of(self.active()?));
        let found = doc.select(&sel).next().map(text_content);
        Ok(found)
    }

    fn require(&self, locator: &Locator) -> Result<(), SessionError> {
        match self.find(locator)? {
            Some(_) => Ok(()),
            None => Err(SessionError::NotFound {
                locator: locator.clone(),
                reason: s!("no match in scripted page"),
            }),
        }
    }
}

impl Session for ScriptedSession {
    fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        self.load(url)?;
        if let Some(view) = self.views.last_mut() {
            *view = s!(url);
        }
        Ok(())
    }

    fn current_url(&self) -> Result<String, SessionError> {
        self.active().map(str::to_string)
    }

    fn page_source(&self) -> Result<String, SessionError> {
        Ok(self.source_of(self.active()?))
    }

    // Pages are static, so waiting cannot change the outcome.
    fn wait_for(&self, locator: &Locator, _timeout: Duration) -> Result<(), SessionError> {
        self.require(locator)
    }

    fn fill(&mut self, locator: &Locator, text: &str, _timeout: Duration) -> Result<(), SessionError> {
        self.require(locator)?;
        self.typed.insert(locator.clone(), s!(text));
        Ok(())
    }

    fn click(&mut self, locator: &Locator, _timeout: Duration) -> Result<(), SessionError> {
        self.require(locator)?;
        let here = self.current_url()?;
        let landing = match &self.login {
            Some(login) if login.url == here => {
                let typed: HashSet<&str> = self.typed.values().map(String::as_str).collect();
                (typed.contains(login.username.as_str()) && typed.contains(login.password.as_str()))
                    .then(|| login.landing.clone())
            }
            _ => None,
        };
        if let Some(url) = landing {
            self.goto(&url)?;
        }
        Ok(())
    }

    fn text_of(&self, locator: &Locator) -> Option<String> {
        self.find(locator).ok().flatten()
    }

    fn open_view(&mut self, url: &str) -> Result<(), SessionError> {
        if self.views.len() > 1 {
            return Err(SessionError::Browser(s!("an auxiliary view is already open")));
        }
        self.views.push(s!("about:blank"));
        let opened = self.goto(url);
        if opened.is_err() {
            self.views.pop();
        }
        opened
    }

    fn close_view(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        if self.views.len() < 2 {
            return Err(SessionError::Browser(s!("no auxiliary view to close")));
        }
        self.views.pop();
        Ok(())
    }

    fn settle(&self, _delay: Duration) {}

    fn teardown(&mut self) {
        self.closed = true;
        self.views.clear();
    }
}

// src/session/chrome.rs
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use tracing::{debug, info, warn};

use super::{Locator, Session, SessionError};
use crate::config::consts::IDLE_BROWSER_SECS;
use crate::config::BrowserOptions;

/// A visible (or headless) Chrome driven over CDP.
///
/// Holds the index tab for the whole run and at most one detail tab.
pub struct ChromeSession {
    browser: Option<Browser>,
    index: Option<Arc<Tab>>,
    detail: Option<Arc<Tab>>,
}

impl ChromeSession {
    pub fn start(opts: &BrowserOptions) -> Result<Self, SessionError> {
        let launch = LaunchOptions::default_builder()
            .headless(opts.headless)
            .window_size(Some((opts.window_width, opts.window_height)))
            .idle_browser_timeout(Duration::from_secs(IDLE_BROWSER_SECS))
            .args(vec![OsStr::new("--start-maximized")])
            .build()
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let browser = Browser::new(launch).map_err(|e| SessionError::Launch(e.to_string()))?;
        let index = browser.new_tab().map_err(browser_err)?;
        info!(headless = opts.headless, "browser started");

        Ok(Self {
            browser: Some(browser),
            index: Some(index),
            detail: None,
        })
    }

    fn active(&self) -> Result<&Arc<Tab>, SessionError> {
        self.detail
            .as_ref()
            .or(self.index.as_ref())
            .ok_or(SessionError::Closed)
    }

    fn browser(&self) -> Result<&Browser, SessionError> {
        self.browser.as_ref().ok_or(SessionError::Closed)
    }
}

fn browser_err(e: impl ToString) -> SessionError {
    SessionError::Browser(e.to_string())
}

fn navigate(tab: &Tab, url: &str) -> Result<(), SessionError> {
    tab.navigate_to(url)
        .and_then(|t| t.wait_until_navigated())
        .map(|_| ())
        .map_err(|e| SessionError::Navigation {
            url: s!(url),
            reason: e.to_string(),
        })
}

fn locate<'a>(tab: &'a Tab, locator: &Locator, timeout: Duration) -> Result<Element<'a>, SessionError> {
    let found = match locator {
        Locator::Css(css) => tab.wait_for_element_with_custom_timeout(css, timeout),
        Locator::Xpath(xpath) => tab.wait_for_xpath_with_custom_timeout(xpath, timeout),
    };
    found.map_err(|e| SessionError::NotFound {
        locator: locator.clone(),
        reason: e.to_string(),
    })
}

fn locate_now<'a>(tab: &'a Tab, locator: &Locator) -> Option<Element<'a>> {
    match locator {
        Locator::Css(css) => tab.find_element(css).ok(),
        Locator::Xpath(xpath) => tab.find_element_by_xpath(xpath).ok(),
    }
}

impl Session for ChromeSession {
    fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        debug!(url, "goto");
        navigate(self.active()?, url)
    }

    fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.active()?.get_url())
    }

    fn page_source(&self) -> Result<String, SessionError> {
        self.active()?.get_content().map_err(browser_err)
    }

    fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<(), SessionError> {
        locate(self.active()?, locator, timeout).map(|_| ())
    }

    fn fill(&mut self, locator: &Locator, text: &str, timeout: Duration) -> Result<(), SessionError> {
        let tab = self.active()?;
        let field = locate(tab, locator, timeout)?;
        field
            .call_js_fn("function() { this.value = ''; }", vec![], false)
            .map_err(browser_err)?;
        field.click().map_err(browser_err)?;
        field.type_into(text).map_err(browser_err)?;
        Ok(())
    }

    fn click(&mut self, locator: &Locator, timeout: Duration) -> Result<(), SessionError> {
        let tab = self.active()?;
        locate(tab, locator, timeout)?.click().map_err(browser_err)?;
        Ok(())
    }

    fn text_of(&self, locator: &Locator) -> Option<String> {
        let tab = self.active().ok()?;
        locate_now(tab, locator)?.get_inner_text().ok()
    }

    fn open_view(&mut self, url: &str) -> Result<(), SessionError> {
        if self.detail.is_some() {
            return Err(SessionError::Browser(s!("a detail tab is already open")));
        }
        let tab = self.browser()?.new_tab().map_err(browser_err)?;
        if let Err(e) = navigate(&tab, url) {
            if let Err(close) = tab.close(true) {
                warn!(error = %close, "could not close failed detail tab");
            }
            return Err(e);
        }
        self.detail = Some(tab);
        Ok(())
    }

    fn close_view(&mut self) -> Result<(), SessionError> {
        let tab = self
            .detail
            .take()
            .ok_or_else(|| SessionError::Browser(s!("no detail tab to close")))?;
        tab.close(true).map_err(browser_err)?;
        if let Some(index) = &self.index {
            index.activate().map_err(browser_err)?;
        }
        Ok(())
    }

    fn teardown(&mut self) {
        if self.browser.is_none() {
            return;
        }
        for tab in [self.detail.take(), self.index.take()].into_iter().flatten() {
            if let Err(e) = tab.close(true) {
                debug!(error = %e, "tab already gone");
            }
        }
        // Dropping the handle kills the Chrome process.
        self.browser = None;
        info!("browser closed");
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

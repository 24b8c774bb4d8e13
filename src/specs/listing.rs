// src/specs/listing.rs
// Index page: one row per mandate, each with a link carrying `?mandat=<code>`.

use std::collections::HashSet;

use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::consts::MANDATE_PARAM;
use crate::core::html::{selector, text_content};
use crate::core::sanitize::normalize;
use crate::record::ListingEntry;
use crate::session::Locator;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingRules {
    /// Present once the listing has rendered.
    pub ready: Locator,
    /// CSS for the per-row detail links.
    pub link_selector: String,
    /// Query parameter holding the mandate code.
    pub id_param: String,
}

impl Default for ListingRules {
    fn default() -> Self {
        Self {
            ready: Locator::css("table.mandats"),
            link_selector: s!("table.mandats a[href*='mandat']"),
            id_param: s!(MANDATE_PARAM),
        }
    }
}

/// Snapshot every row of the rendered listing, in page order.
///
/// Rows without an href, a code, or link text are dropped. A code seen twice
/// keeps its first row.
pub fn capture_entries(html: &str, index_url: &str, rules: &ListingRules) -> Vec<ListingEntry> {
    let Some(links) = selector(&rules.link_selector) else {
        return Vec::new();
    };
    let base = Url::parse(index_url).ok();
    let doc = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for link in doc.select(&links) {
        let Some(href) = link.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            continue;
        };
        let url = resolve(base.as_ref(), href);
        let code = code_from_url(&url, &rules.id_param).unwrap_or_default();
        let text = normalize(&text_content(link));

        if code.is_empty() || text.is_empty() {
            debug!(href, "listing row without code or text, skipped");
            continue;
        }
        if !seen.insert(code.clone()) {
            warn!(code = %code, "duplicate row on the listing, keeping the first");
            continue;
        }
        entries.push(ListingEntry { code, url, text });
    }
    entries
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    base.and_then(|b| b.join(href).ok())
        .or_else(|| Url::parse(href).ok())
        .map(String::from)
        .unwrap_or_else(|| s!(href))
}

/// Mandate code from `url`'s query string. Falls back to a plain split on
/// `<param>=` for hrefs the URL parser rejects.
pub fn code_from_url(url: &str, param: &str) -> Option<String> {
    let from_query = Url::parse(url).ok().and_then(|u| {
        u.query_pairs()
            .find(|(k, _)| k == param)
            .map(|(_, v)| v.trim().to_string())
    });
    let code = from_query.or_else(|| {
        let marker = format!("{param}=");
        let (_, rest) = url.split_once(&marker)?;
        rest.split(['&', '#']).next().map(|v| v.trim().to_string())
    })?;
    (!code.is_empty()).then_some(code)
}

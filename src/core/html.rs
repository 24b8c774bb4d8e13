// src/core/html.rs
// Small helpers over `scraper` snapshots of the portal pages.
// Everything here is read-only and tolerant: a bad selector or a missing
// node gives `None`/empty, never an error.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Parse a CSS selector coming from configuration.
/// Invalid selectors are logged once by the caller's compile step and skipped.
pub fn selector(css: &str) -> Option<Selector> {
    let css = css.trim();
    if css.is_empty() {
        return None;
    }
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!(selector = css, error = %e, "invalid CSS selector, lookup disabled");
            None
        }
    }
}

/// Full text content of an element (like DOM `textContent`), unnormalized.
pub fn text_content(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Text from the element's own text nodes only, children excluded.
pub fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect()
}

/// First element sibling after `el`.
pub fn next_element_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Element ancestors, nearest first.
pub fn element_ancestors<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.ancestors().filter_map(ElementRef::wrap)
}

/// True if `inner` is `outer` or sits anywhere below it.
pub fn is_within(inner: ElementRef<'_>, outer: ElementRef<'_>) -> bool {
    inner.id() == outer.id() || inner.ancestors().any(|node| node.id() == outer.id())
}

/// Every element in the document, in document order.
pub fn all_elements(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> + '_ {
    doc.root_element().descendants().filter_map(ElementRef::wrap)
}

/// `href` of the element itself if it is a link, else of its first link descendant.
pub fn first_href(el: ElementRef<'_>) -> Option<String> {
    if el.value().name() == "a" {
        if let Some(href) = el.value().attr("href") {
            return Some(href.to_string());
        }
    }
    let anchors = Selector::parse("a[href]").ok()?;
    el.select(&anchors)
        .find_map(|a| a.value().attr("href"))
        .map(str::to_string)
}

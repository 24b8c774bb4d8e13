// src/specs/detail.rs
//! Detail page: validity/channel classification and the full field pass.

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fields::{default_fields, FieldResolver, FieldSpec, GroupRules};
use crate::core::html::{next_element_sibling, selector, text_content};
use crate::core::sanitize::{fold, normalize};
use crate::record::{Channel, ListingEntry, MandateRecord, Validity};
use crate::session::Locator;

/// Elements matching `selector`, optionally narrowed to those whose text
/// contains `phrase` (case-insensitive).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,
}

impl Marker {
    fn new(selector: &str, phrase: Option<&str>) -> Self {
        Self {
            selector: s!(selector),
            phrase: phrase.map(String::from),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailRules {
    /// Optional element to wait for before snapshotting the detail page.
    pub ready: Option<Locator>,
    pub fields: Vec<FieldSpec>,
    pub groups: GroupRules,
    pub access_denied: Marker,
    /// First capture group is the reference id shown on the denial page.
    pub reference_pattern: String,
    pub native: Marker,
    pub external: Marker,
}

impl Default for DetailRules {
    fn default() -> Self {
        Self {
            ready: None,
            fields: default_fields(),
            groups: GroupRules::default(),
            access_denied: Marker::new(
                "h1, h2, h3, .t-Alert-title, .t-Alert-body, .alert",
                Some("Accès refusé"),
            ),
            reference_pattern: s!(r"(?i)r[ée]f[ée]rence\s*:\s*([A-Za-z0-9-]*\d[A-Za-z0-9-]*)"),
            native: Marker::new("input[type='file']", None),
            external: Marker::new(
                "h1, h2, h3, h4, .t-Region-title, .t-Alert-title",
                Some("Instructions pour postuler"),
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    AccessDenied { reference: Option<String> },
    Open(Channel),
}

#[derive(Debug)]
struct CompiledMarker {
    selector: Option<Selector>,
    phrase: Option<String>,
}

impl CompiledMarker {
    fn new(marker: &Marker) -> Self {
        Self {
            selector: selector(&marker.selector),
            phrase: marker.phrase.as_deref().map(fold).filter(|p| !p.is_empty()),
        }
    }

    /// Every matching element.
    fn hits<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let Some(sel) = &self.selector else {
            return Vec::new();
        };
        doc.select(sel)
            .filter(|el| match &self.phrase {
                Some(phrase) => fold(&text_content(*el)).contains(phrase.as_str()),
                None => true,
            })
            .collect()
    }

    fn present(&self, doc: &Html) -> bool {
        !self.hits(doc).is_empty()
    }
}

/// Text of each denial panel followed by the element right after it, where
/// the alert body usually sits.
fn panel_texts(hits: &[ElementRef<'_>]) -> Vec<String> {
    hits.iter()
        .flat_map(|el| std::iter::once(*el).chain(next_element_sibling(*el)))
        .map(|el| normalize(&text_content(el)))
        .collect()
}

/// [`DetailRules`] compiled once per run.
#[derive(Debug)]
pub struct DetailParser {
    fields: Vec<FieldSpec>,
    resolver: FieldResolver,
    access_denied: CompiledMarker,
    reference: Option<Regex>,
    native: CompiledMarker,
    external: CompiledMarker,
}

impl DetailParser {
    pub fn new(rules: &DetailRules) -> Self {
        let slots = MandateRecord::default();
        for spec in &rules.fields {
            if slots.field(&spec.key).is_none() {
                warn!(key = %spec.key, "field table entry has no record slot, ignored");
            }
        }
        let reference = match Regex::new(&rules.reference_pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(error = %e, "invalid reference pattern, reference ids disabled");
                None
            }
        };
        Self {
            fields: rules.fields.clone(),
            resolver: FieldResolver::new(&rules.groups),
            access_denied: CompiledMarker::new(&rules.access_denied),
            reference,
            native: CompiledMarker::new(&rules.native),
            external: CompiledMarker::new(&rules.external),
        }
    }

    /// Exactly one outcome per page. Anything that is not clearly a native
    /// application counts as external.
    pub fn classify(&self, doc: &Html) -> Classification {
        let denied = self.access_denied.hits(doc);
        if !denied.is_empty() {
            let reference = self.reference.as_ref().and_then(|re| {
                panel_texts(&denied)
                    .iter()
                    .find_map(|text| re.captures(text)?.get(1).map(|m| s!(m.as_str())))
            });
            return Classification::AccessDenied { reference };
        }
        let native = self.native.present(doc);
        let external = self.external.present(doc);
        if native && external {
            debug!("both native and external markers present, treating as external");
        }
        if native && !external {
            Classification::Open(Channel::Native)
        } else {
            Classification::Open(Channel::External)
        }
    }

    /// Build the record for the detail page at `url`.
    pub fn extract(
        &self,
        doc: &Html,
        entry: &ListingEntry,
        url: &str,
        now: DateTime<Utc>,
    ) -> MandateRecord {
        let channel = match self.classify(doc) {
            Classification::AccessDenied { reference } => {
                debug!(code = %entry.code, ?reference, "access denied");
                return MandateRecord::access_denied(entry, url, reference, now);
            }
            Classification::Open(channel) => channel,
        };

        let mut record = MandateRecord {
            url: s!(url),
            channel,
            extracted_at: Some(now),
            ..MandateRecord::default()
        };
        for spec in &self.fields {
            let value = self.resolver.resolve(doc, spec);
            record.set_field(&spec.key, value);
        }
        record.normalize_in_place();

        if record.code.is_empty() {
            record.code = normalize(&entry.code);
            record.validity = Validity::Unknown;
        } else {
            if record.code != entry.code {
                warn!(
                    page = %record.code,
                    listing = %entry.code,
                    "page code differs from listing, this row is revisited on every run"
                );
            }
            record.validity = Validity::Valid;
        }
        if record.title.is_empty() {
            record.title = normalize(&entry.text);
        }
        record
    }

    /// Convenience over [`Self::extract`] for a raw page source.
    pub fn extract_html(
        &self,
        html: &str,
        entry: &ListingEntry,
        url: &str,
        now: DateTime<Utc>,
    ) -> MandateRecord {
        self.extract(&Html::parse_document(html), entry, url, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::consts::ACCESS_DENIED_STATUS;

    fn entry() -> ListingEntry {
        ListingEntry {
            code: s!("102"),
            url: s!("https://portal.example/detail?mandat=102"),
            text: s!("Stage B"),
        }
    }

    fn parser() -> DetailParser {
        DetailParser::new(&DetailRules::default())
    }

    const FULL: &str = r#"<html><body>
        <h1>Mandat</h1>
        <div><span>Code du mandat:</span><span>102</span></div>
        <div><span>Titre du mandat:</span><span>Stage&nbsp;en R&amp;D</span></div>
        <div><span>Employeur:</span><span>Ã‰cole Polytechnique</span></div>
        <div><span>Site Web:</span><span><a href="https://acme.example">Acme</a></span></div>
        <div><span>Date limite pour postuler:</span><span>30-11-2026</span></div>
        <div class="t-Form-fieldContainer"><label>Durée</label><span class="display_only">4 mois</span></div>
        <div><span>Exigences du mandat:</span><div>Rust,
            SQL</div></div>
        <form><input type="file" name="cv"></form>
    </body></html>"#;

    #[test]
    fn full_pass_resolves_and_normalizes() {
        let now = Utc::now();
        let record = parser().extract_html(FULL, &entry(), "https://portal.example/detail?mandat=102", now);
        assert_eq!(record.code, "102");
        assert_eq!(record.title, "Stage en R&D");
        assert_eq!(record.employer, "École Polytechnique");
        assert_eq!(record.website, "https://acme.example");
        assert_eq!(record.deadline, "30-11-2026");
        assert_eq!(record.duration, "4 mois");
        assert_eq!(record.requirements, "Rust, SQL");
        assert_eq!(record.validity, Validity::Valid);
        assert_eq!(record.channel, Channel::Native);
        assert_eq!(record.extracted_at, Some(now));
        assert_eq!(record.work_mode, "");
    }

    #[test]
    fn access_denied_short_circuits() {
        let html = r#"<html><body>
            <div class="t-Alert-title">Accès refusé</div>
            <div class="t-Alert-body">Vous n'avez pas accès. Référence : AB-1234</div>
            <div><span>Description du mandat:</span><span>secret</span></div>
        </body></html>"#;
        let record = parser().extract_html(html, &entry(), "https://p/x", Utc::now());
        assert_eq!(record.validity, Validity::AccessDenied);
        assert_eq!(record.status_text, ACCESS_DENIED_STATUS);
        assert_eq!(record.reference.as_deref(), Some("AB-1234"));
        assert_eq!(record.title, "Stage B");
        assert_eq!(record.code, "102");
        assert!(record.description.is_empty());
        assert!(record.requirements.is_empty());
    }

    #[test]
    fn denial_without_reference_id_has_none() {
        let doc = Html::parse_document(
            r#"<h2>Accès refusé</h2><p>La référence du mandat est introuvable.</p>
               <footer>Référence: QZ-77</footer>"#,
        );
        assert_eq!(parser().classify(&doc), Classification::AccessDenied { reference: None });
    }

    #[test]
    fn absent_labels_stay_empty_despite_longer_lookalikes() {
        let html = r#"<html><body>
            <div><span>Code du mandat:</span><span>102</span></div>
            <div><span>Description de l'employeur:</span><span>Une grande société</span></div>
            <div><span>Précisions sur le mode de travail:</span><span>2 jours au bureau</span></div>
        </body></html>"#;
        let record = parser().extract_html(html, &entry(), "https://p/x", Utc::now());
        assert_eq!(record.employer_description, "Une grande société");
        assert_eq!(record.employer, "");
        assert_eq!(record.work_mode, "");
    }

    #[test]
    fn channel_defaults_to_external() {
        let p = parser();
        let none = Html::parse_document("<p>rien</p>");
        assert_eq!(p.classify(&none), Classification::Open(Channel::External));

        let both = Html::parse_document(
            r#"<h2>Instructions pour postuler</h2><p>Envoyez un courriel.</p><input type="file">"#,
        );
        assert_eq!(p.classify(&both), Classification::Open(Channel::External));

        let native = Html::parse_document(r#"<form><input type="file"></form>"#);
        assert_eq!(p.classify(&native), Classification::Open(Channel::Native));
    }

    #[test]
    fn listing_values_fill_gaps() {
        let record = parser().extract_html("<html><body></body></html>", &entry(), "https://p/x", Utc::now());
        assert_eq!(record.code, "102");
        assert_eq!(record.title, "Stage B");
        assert_eq!(record.validity, Validity::Unknown);
    }

    #[test]
    fn bad_rules_degrade_quietly() {
        let rules = DetailRules {
            reference_pattern: s!("(unclosed"),
            access_denied: Marker::new("h1[", Some("Accès refusé")),
            ..DetailRules::default()
        };
        let p = DetailParser::new(&rules);
        let doc = Html::parse_document("<h1>Accès refusé</h1>");
        // The denial selector is unusable, so the page reads as an open posting.
        assert_eq!(p.classify(&doc), Classification::Open(Channel::External));
    }
}

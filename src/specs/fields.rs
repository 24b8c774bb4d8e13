// src/specs/fields.rs
//! Label-driven field lookup on the detail page.
//!
//! The detail page is a loose label/value layout that has shipped in at least
//! two shapes: inline `Label:` text followed by a value element, and form
//! groups with a `<label>` and a display-only value. Each field is resolved
//! by trying its [`Strategy`] list in order until one yields non-empty text.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::core::html::{
    all_elements, element_ancestors, first_href, is_within, next_element_sibling, own_text,
    selector, text_content,
};
use crate::core::sanitize::{fold, normalize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Element whose own text contains `Label:`; value is its next sibling.
    Adjacent,
    /// `<label>`-like element inside a field group; value is a display element.
    Grouped,
    /// `href` of the value element found by either of the above.
    AnchorHref,
}

pub const DEFAULT_ORDER: [Strategy; 2] = [Strategy::Adjacent, Strategy::Grouped];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// JSON key in the persisted record.
    pub key: String,
    /// Label as printed on the page, without the trailing colon.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategies: Option<Vec<Strategy>>,
}

impl FieldSpec {
    pub fn strategies(&self) -> &[Strategy] {
        self.strategies.as_deref().unwrap_or(&DEFAULT_ORDER)
    }
}

pub fn default_fields() -> Vec<FieldSpec> {
    fields![
        "etat_mandat" => "État du mandat",
        "date_limite" => "Date limite pour postuler",
        "employeur" => "Employeur",
        "description_employeur" => "Description de l'employeur",
        "site_web" => "Site Web" [AnchorHref, Adjacent, Grouped],
        "lieu_travail" => "Lieu du travail",
        "mode_travail" => "Mode de travail",
        "precisions_mode_travail" => "Précisions sur le mode de travail",
        "code_mandat" => "Code du mandat",
        "debut_mandat" => "Début du mandat",
        "duree" => "Durée",
        "possibilite_prolongation" => "Possibilité de prolongation",
        "titre_mandat" => "Titre du mandat",
        "description_mandat" => "Description du mandat",
        "exigences_mandat" => "Exigences du mandat",
        "niveau_etudes" => "Niveau d'études requis",
        "specialites" => "Spécialités",
    ]
}

/// Selectors used by [`Strategy::Grouped`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupRules {
    pub label: String,
    pub group: String,
    pub value: String,
}

impl Default for GroupRules {
    fn default() -> Self {
        Self {
            label: s!("label, .t-Form-label"),
            group: s!(".t-Form-fieldContainer, .form-group, .field"),
            value: s!(".display_only, .t-Form-itemText, span.value, a"),
        }
    }
}

/// [`GroupRules`] compiled once per run. A selector that fails to parse
/// disables the grouped strategy; the others keep working.
#[derive(Debug)]
pub struct FieldResolver {
    label: Option<Selector>,
    group: Option<Selector>,
    value: Option<Selector>,
}

impl FieldResolver {
    pub fn new(rules: &GroupRules) -> Self {
        Self {
            label: selector(&rules.label),
            group: selector(&rules.group),
            value: selector(&rules.value),
        }
    }

    /// Resolve one field. Unresolved fields are `""`.
    pub fn resolve(&self, doc: &Html, spec: &FieldSpec) -> String {
        spec.strategies()
            .iter()
            .find_map(|strategy| self.apply(*strategy, doc, &spec.label))
            .unwrap_or_default()
    }

    pub fn apply(&self, strategy: Strategy, doc: &Html, label: &str) -> Option<String> {
        match strategy {
            Strategy::Adjacent => adjacent_values(doc, label).find_map(non_empty_text),
            Strategy::Grouped => self.grouped_values(doc, label).into_iter().find_map(non_empty_text),
            Strategy::AnchorHref => adjacent_values(doc, label)
                .chain(self.grouped_values(doc, label))
                .find_map(|el| first_href(el).map(|h| normalize(&h)).filter(|h| !h.is_empty())),
        }
    }

    fn grouped_values<'a>(&self, doc: &'a Html, label: &str) -> Vec<ElementRef<'a>> {
        let (Some(label_sel), Some(value_sel)) = (&self.label, &self.value) else {
            return Vec::new();
        };
        let needle = fold(label);

        let mut labels: Vec<(u8, ElementRef<'a>)> = doc
            .select(label_sel)
            .filter_map(|el| {
                let text = fold(&text_content(el));
                label_rank(text.trim_end_matches(':').trim_end(), &needle).map(|r| (r, el))
            })
            .collect();
        labels.sort_by_key(|(rank, _)| *rank);

        let mut out = Vec::new();
        for (_, label_el) in labels {
            let group = self
                .group
                .as_ref()
                .and_then(|g| element_ancestors(label_el).find(|a| g.matches(a)));
            if let Some(group) = group {
                out.extend(group.select(value_sel).filter(|v| !is_within(*v, label_el)));
            }
            if let Some(sibling) = next_element_sibling(label_el) {
                if value_sel.matches(&sibling) {
                    out.push(sibling);
                }
                out.extend(sibling.select(value_sel));
            }
        }
        out
    }
}

/// Value elements for the inline `Label:` layout. The label must open the
/// element's own text, so "Employeur:" never matches "Description de l'employeur:".
fn adjacent_values<'a>(doc: &'a Html, label: &str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let needle = format!("{}:", fold(label));
    all_elements(doc)
        .filter(move |el| fold(&own_text(*el)).starts_with(&needle))
        .filter_map(next_element_sibling)
}

fn label_rank(text: &str, needle: &str) -> Option<u8> {
    if text == needle {
        Some(0)
    } else if text.starts_with(needle) {
        Some(1)
    } else {
        None
    }
}

fn non_empty_text(el: ElementRef<'_>) -> Option<String> {
    let text = normalize(&text_content(el));
    (!text.is_empty()).then_some(text)
}

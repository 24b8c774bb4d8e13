// src/record.rs
//! Mandate records as persisted in `mandats.json`, plus the ephemeral
//! listing entries captured from the index page.
//!
//! JSON keys are the portal's historical French names so stores written by
//! earlier runs, and the downstream filter/letter tooling, keep working.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::consts::ACCESS_DENIED_STATUS;
use crate::core::sanitize::normalize;

/// Listing validity as seen on the detail page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Validity {
    Valid,
    AccessDenied,
    #[default]
    Unknown,
}

/// Where the application happens. Serialized as the historical `Oui`/`Non`
/// of `postulation_laruche`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "Oui")]
    Native,
    #[default]
    #[serde(rename = "Non")]
    External,
}

/// One job posting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateRecord {
    #[serde(rename = "code_mandat")]
    pub code: String,
    #[serde(rename = "titre_mandat", default)]
    pub title: String,
    #[serde(rename = "etat_mandat", default)]
    pub status_text: String,
    #[serde(rename = "date_limite", default)]
    pub deadline: String,
    #[serde(rename = "employeur", default)]
    pub employer: String,
    #[serde(rename = "description_employeur", default)]
    pub employer_description: String,
    #[serde(rename = "site_web", default)]
    pub website: String,
    #[serde(rename = "lieu_travail", default)]
    pub work_location: String,
    #[serde(rename = "mode_travail", default)]
    pub work_mode: String,
    #[serde(rename = "precisions_mode_travail", default)]
    pub work_mode_details: String,
    #[serde(rename = "debut_mandat", default)]
    pub start_date: String,
    #[serde(rename = "duree", default)]
    pub duration: String,
    #[serde(rename = "possibilite_prolongation", default)]
    pub extension: String,
    #[serde(rename = "niveau_etudes", default)]
    pub education_level: String,
    #[serde(rename = "specialites", default)]
    pub specialties: String,
    #[serde(rename = "exigences_mandat", default)]
    pub requirements: String,
    #[serde(rename = "description_mandat", default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "validite", default)]
    pub validity: Validity,
    #[serde(rename = "postulation_laruche", default)]
    pub channel: Channel,
    #[serde(rename = "reference_acces", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "date_extraction", default, skip_serializing_if = "Option::is_none")]
    pub extracted_at: Option<DateTime<Utc>>,
}

impl MandateRecord {
    /// Minimal record for a detail page the viewer may not see.
    pub fn access_denied(
        entry: &ListingEntry,
        url: &str,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            code: entry.code.clone(),
            title: entry.text.clone(),
            status_text: s!(ACCESS_DENIED_STATUS),
            url: s!(url),
            validity: Validity::AccessDenied,
            channel: Channel::External,
            reference,
            extracted_at: Some(now),
            ..Self::default()
        };
        record.normalize_in_place();
        record
    }

    /// Set a text field by its JSON key. Returns false for unknown keys.
    pub fn set_field(&mut self, key: &str, value: String) -> bool {
        match self.field_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Read a text field by its JSON key.
    pub fn field(&self, key: &str) -> Option<&str> {
        let value = match key {
            "code_mandat" => &self.code,
            "titre_mandat" => &self.title,
            "etat_mandat" => &self.status_text,
            "date_limite" => &self.deadline,
            "employeur" => &self.employer,
            "description_employeur" => &self.employer_description,
            "site_web" => &self.website,
            "lieu_travail" => &self.work_location,
            "mode_travail" => &self.work_mode,
            "precisions_mode_travail" => &self.work_mode_details,
            "debut_mandat" => &self.start_date,
            "duree" => &self.duration,
            "possibilite_prolongation" => &self.extension,
            "niveau_etudes" => &self.education_level,
            "specialites" => &self.specialties,
            "exigences_mandat" => &self.requirements,
            "description_mandat" => &self.description,
            "url" => &self.url,
            _ => return None,
        };
        Some(value)
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        let slot = match key {
            "code_mandat" => &mut self.code,
            "titre_mandat" => &mut self.title,
            "etat_mandat" => &mut self.status_text,
            "date_limite" => &mut self.deadline,
            "employeur" => &mut self.employer,
            "description_employeur" => &mut self.employer_description,
            "site_web" => &mut self.website,
            "lieu_travail" => &mut self.work_location,
            "mode_travail" => &mut self.work_mode,
            "precisions_mode_travail" => &mut self.work_mode_details,
            "debut_mandat" => &mut self.start_date,
            "duree" => &mut self.duration,
            "possibilite_prolongation" => &mut self.extension,
            "niveau_etudes" => &mut self.education_level,
            "specialites" => &mut self.specialties,
            "exigences_mandat" => &mut self.requirements,
            "description_mandat" => &mut self.description,
            "url" => &mut self.url,
            _ => return None,
        };
        Some(slot)
    }

    /// Run every text field through the normalizer.
    pub fn normalize_in_place(&mut self) {
        for slot in [
            &mut self.code,
            &mut self.title,
            &mut self.status_text,
            &mut self.deadline,
            &mut self.employer,
            &mut self.employer_description,
            &mut self.website,
            &mut self.work_location,
            &mut self.work_mode,
            &mut self.work_mode_details,
            &mut self.start_date,
            &mut self.duration,
            &mut self.extension,
            &mut self.education_level,
            &mut self.specialties,
            &mut self.requirements,
            &mut self.description,
            &mut self.url,
        ] {
            *slot = normalize(slot);
        }
        if let Some(reference) = self.reference.as_mut() {
            *reference = normalize(reference);
        }
    }
}

/// A row captured from the index page before any navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingEntry {
    pub code: String,
    pub url: String,
    pub text: String,
}

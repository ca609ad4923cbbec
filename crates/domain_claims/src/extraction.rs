//! Extracted fields and the typed mapping into claim inputs
//!
//! The AI extraction service returns labeled field/value pairs. Downstream
//! consumers never match labels by substring; lookup is exact and
//! case-insensitive through [`FieldIndex`], and the projection into typed
//! claim inputs is the explicit table in [`project_fields`].

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::claim::{Claim, Gender};
use crate::codes::parse_service_date;

/// Category of an extracted field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Patient,
    Provider,
    Claim,
    Codes,
}

/// A single field extracted from a claim document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedField {
    /// Field category
    pub category: FieldCategory,
    /// Field label as extracted (e.g., "Member ID")
    pub label: String,
    /// Field value
    pub value: String,
    /// Extraction confidence 0-100
    pub confidence: u8,
    /// True once a reviewer has hand-edited the value
    pub is_edited: bool,
}

impl ExtractedField {
    pub fn new(
        category: FieldCategory,
        label: impl Into<String>,
        value: impl Into<String>,
        confidence: u8,
    ) -> Self {
        Self {
            category,
            label: label.into(),
            value: value.into(),
            confidence: confidence.min(100),
            is_edited: false,
        }
    }
}

/// Case-insensitive exact-label lookup over a set of extracted fields
///
/// The last field wins when two share a label, matching replace-on-re-extract
/// behavior upstream.
#[derive(Debug, Default)]
pub struct FieldIndex {
    by_label: HashMap<String, String>,
}

impl FieldIndex {
    /// Builds an index from extracted fields
    pub fn build(fields: &[ExtractedField]) -> Self {
        let mut by_label = HashMap::with_capacity(fields.len());
        for field in fields {
            by_label.insert(field.label.to_lowercase(), field.value.clone());
        }
        Self { by_label }
    }

    /// Looks up a field value by exact label, ignoring case
    pub fn get(&self, label: &str) -> Option<&str> {
        self.by_label.get(&label.to_lowercase()).map(String::as_str)
    }

    /// Returns true if no fields are indexed
    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }
}

// Canonical labels the extraction service is prompted to emit.
pub const LABEL_MEMBER_ID: &str = "Member ID";
pub const LABEL_PATIENT_DOB: &str = "Patient Date of Birth";
pub const LABEL_PATIENT_GENDER: &str = "Patient Gender";
pub const LABEL_PROVIDER_NPI: &str = "Provider NPI";
pub const LABEL_PRIOR_AUTH: &str = "Prior Authorization Number";
pub const LABEL_DATE_OF_SERVICE: &str = "Date of Service";

/// Projects extracted fields into the claim's typed inputs
///
/// Only fills fields the claim does not already carry; intake data and
/// reviewer edits to the claim itself are never overwritten. Unparseable
/// dates and genders are left unset rather than guessed.
pub fn project_fields(claim: &mut Claim) {
    let index = FieldIndex::build(&claim.extracted_fields);
    if index.is_empty() {
        return;
    }

    if claim.member_id.is_none() {
        claim.member_id = index.get(LABEL_MEMBER_ID).map(str::to_string);
    }
    if claim.provider_npi.is_none() {
        claim.provider_npi = index.get(LABEL_PROVIDER_NPI).map(str::to_string);
    }
    if claim.prior_auth_number.is_none() {
        claim.prior_auth_number = index.get(LABEL_PRIOR_AUTH).map(str::to_string);
    }
    if claim.patient_dob.is_none() {
        claim.patient_dob = index.get(LABEL_PATIENT_DOB).and_then(parse_date_lenient);
    }
    if claim.date_of_service.is_none() {
        claim.date_of_service = index.get(LABEL_DATE_OF_SERVICE).and_then(parse_date_lenient);
    }
    if claim.patient_gender.is_none() {
        claim.patient_gender = index.get(LABEL_PATIENT_GENDER).and_then(parse_gender);
    }

    debug!(claim_id = %claim.id, "projected extracted fields into typed claim inputs");
}

fn parse_date_lenient(value: &str) -> Option<NaiveDate> {
    parse_service_date(value.trim())
}

fn parse_gender(value: &str) -> Option<Gender> {
    match value.trim().to_lowercase().as_str() {
        "m" | "male" => Some(Gender::Male),
        "f" | "female" => Some(Gender::Female),
        "u" | "unknown" => Some(Gender::Unknown),
        _ => None,
    }
}

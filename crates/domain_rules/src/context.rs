//! Fact context for rule evaluation

use std::collections::HashMap;

use chrono::NaiveDate;
use core_kernel::Money;
use domain_claims::{Claim, FieldIndex};

/// The facts a rule condition can reference
///
/// Field resolution order:
/// 1. fields prefixed with `_` read the free-form metadata map,
/// 2. the reserved names "Total Charges", "Date of Service", and
///    "Document Type" read the dedicated context fields,
/// 3. everything else resolves by case-insensitive exact match against an
///    extracted-field label.
///
/// Unresolved fields evaluate as absent (`None`).
pub struct RuleContext {
    fields: FieldIndex,
    total_charges: Option<Money>,
    date_of_service: Option<NaiveDate>,
    document_type: Option<String>,
    metadata: HashMap<String, String>,
}

const RESERVED_TOTAL_CHARGES: &str = "total charges";
const RESERVED_DATE_OF_SERVICE: &str = "date of service";
const RESERVED_DOCUMENT_TYPE: &str = "document type";

impl RuleContext {
    pub fn new(fields: FieldIndex) -> Self {
        Self {
            fields,
            total_charges: None,
            date_of_service: None,
            document_type: None,
            metadata: HashMap::new(),
        }
    }

    /// Builds a context from a claim snapshot
    ///
    /// A claim whose charges cannot be summed contributes no
    /// "Total Charges" fact rather than failing evaluation.
    pub fn from_claim(claim: &Claim) -> Self {
        let mut ctx = Self::new(FieldIndex::build(&claim.extracted_fields));
        ctx.total_charges = claim.total_charges().ok();
        ctx.date_of_service = claim.date_of_service;
        ctx.document_type = claim
            .documents
            .iter()
            .find_map(|d| d.document_type.clone());
        ctx
    }

    pub fn with_total_charges(mut self, charges: Money) -> Self {
        self.total_charges = Some(charges);
        self
    }

    pub fn with_date_of_service(mut self, date: NaiveDate) -> Self {
        self.date_of_service = Some(date);
        self
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Resolves a condition field reference to its string value
    pub fn resolve(&self, field: &str) -> Option<String> {
        if let Some(key) = field.strip_prefix('_') {
            return self.metadata.get(key).cloned();
        }

        match field.to_lowercase().as_str() {
            RESERVED_TOTAL_CHARGES => {
                return self.total_charges.map(|m| m.amount().to_string());
            }
            RESERVED_DATE_OF_SERVICE => {
                return self
                    .date_of_service
                    .map(|d| d.format("%Y-%m-%d").to_string());
            }
            RESERVED_DOCUMENT_TYPE => {
                return self.document_type.clone();
            }
            _ => {}
        }

        self.fields.get(field).map(str::to_string)
    }
}

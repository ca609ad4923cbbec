//! Pre-built test data

use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal_macros::dec;

use domain_claims::{Claim, ExtractedField, FieldCategory};

use crate::builders::ClaimBuilder;

/// NPI with a correct check digit
pub const VALID_NPI: &str = "1234567893";
/// Ten digits, wrong check digit
pub const INVALID_NPI: &str = "1234567890";
/// Well-formed authorization number
pub const VALID_AUTH: &str = "AUTH-2024-000123";

/// A claim that should route to CLEAN_SUBMISSION untouched
pub fn clean_claim() -> Claim {
    ClaimBuilder::new().build()
}

/// A total knee arthroplasty claim with prior auth and supporting diagnosis
/// but no attached documentation
pub fn knee_replacement_claim() -> Claim {
    ClaimBuilder::new()
        .with_diagnoses(&["M17.11"])
        .with_procedure("27447", dec!(9500))
        .with_prior_auth(VALID_AUTH)
        .build()
}

/// The field set the AI extractor typically produces for a CMS-1500
pub fn standard_extracted_fields() -> Vec<ExtractedField> {
    let patient_name: String = Name().fake();
    vec![
        ExtractedField::new(FieldCategory::Patient, "Patient Name", patient_name, 88),
        ExtractedField::new(FieldCategory::Patient, "Member ID", "MBR-1001", 96),
        ExtractedField::new(
            FieldCategory::Patient,
            "Patient Date of Birth",
            "1980-04-12",
            94,
        ),
        ExtractedField::new(FieldCategory::Patient, "Patient Gender", "F", 91),
        ExtractedField::new(FieldCategory::Provider, "Provider NPI", VALID_NPI, 95),
        ExtractedField::new(FieldCategory::Claim, "Date of Service", "2024-03-15", 93),
    ]
}

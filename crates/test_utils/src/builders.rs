//! Test Data Builders
//!
//! Builder patterns for constructing test claims with sensible defaults.
//! Tests specify only the fields they care about.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::Money;
use domain_claims::{Claim, ClaimDocument, ClaimStatus, Gender, OcrStatus, ProcedureLine};

use crate::fixtures::VALID_NPI;

/// Builder for test claims
pub struct ClaimBuilder {
    claim: Claim,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    /// A received claim with valid demographics and one office visit
    pub fn new() -> Self {
        let mut claim = Claim::received("CLM-TEST-0001");
        claim.member_id = Some("MBR-1001".to_string());
        claim.provider_npi = Some(VALID_NPI.to_string());
        claim.patient_dob = NaiveDate::from_ymd_opt(1980, 4, 12);
        claim.patient_gender = Some(Gender::Female);
        claim.date_of_service = NaiveDate::from_ymd_opt(2024, 3, 15);
        claim.diagnosis_codes = vec!["M54.5".to_string()];
        claim
            .procedures
            .push(ProcedureLine::new("99213", Money::usd(dec!(150))));
        Self { claim }
    }

    /// Starts from an empty received claim with no defaults at all
    pub fn bare(claim_number: impl Into<String>) -> Self {
        Self {
            claim: Claim::received(claim_number),
        }
    }

    pub fn with_claim_number(mut self, number: impl Into<String>) -> Self {
        self.claim.claim_number = number.into();
        self
    }

    pub fn with_member_id(mut self, member_id: Option<&str>) -> Self {
        self.claim.member_id = member_id.map(str::to_string);
        self
    }

    pub fn with_npi(mut self, npi: Option<&str>) -> Self {
        self.claim.provider_npi = npi.map(str::to_string);
        self
    }

    pub fn with_prior_auth(mut self, auth: &str) -> Self {
        self.claim.prior_auth_number = Some(auth.to_string());
        self
    }

    pub fn with_dob(mut self, year: i32, month: u32, day: u32) -> Self {
        self.claim.patient_dob = NaiveDate::from_ymd_opt(year, month, day);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.claim.patient_gender = Some(gender);
        self
    }

    pub fn with_diagnoses(mut self, codes: &[&str]) -> Self {
        self.claim.diagnosis_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Replaces all procedure lines with a single one
    pub fn with_procedure(mut self, code: &str, charge: Decimal) -> Self {
        self.claim.procedures = vec![ProcedureLine::new(code, Money::usd(charge))];
        self
    }

    pub fn add_procedure(mut self, code: &str, charge: Decimal) -> Self {
        self.claim
            .procedures
            .push(ProcedureLine::new(code, Money::usd(charge)));
        self
    }

    /// Attaches a document with a known type label
    pub fn with_document(mut self, file_ref: &str, document_type: Option<&str>) -> Self {
        let mut document = ClaimDocument::new(file_ref);
        document.document_type = document_type.map(str::to_string);
        self.claim.documents.push(document);
        self
    }

    /// Attaches a document whose OCR already completed with the given text
    pub fn with_ocr_document(mut self, file_ref: &str, text: &str) -> Self {
        let mut document = ClaimDocument::new(file_ref);
        document.ocr_status = OcrStatus::Completed;
        document.ocr_text = Some(text.to_string());
        document.ocr_confidence = Some(93);
        self.claim.documents.push(document);
        self
    }

    pub fn with_status(mut self, status: ClaimStatus) -> Self {
        self.claim.status = status;
        self
    }

    pub fn build(self) -> Claim {
        self.claim
    }
}

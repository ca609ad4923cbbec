//! Claim aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, DocumentId, Currency, Money};
use crate::check::ValidationCheck;
use crate::extraction::ExtractedField;
use crate::error::ClaimError;

/// Claim status as surfaced to the intake dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Uploaded, not yet picked up by the pipeline
    Received,
    /// Workflow in progress
    Processing,
    /// Routed to the exception queue for auto-correction
    Exception,
    /// Routed to a human review queue
    HumanReview,
    /// Submitted to the clearinghouse
    Submitted,
    /// Workflow failed; needs operator attention
    Failed,
}

/// Patient gender as billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

/// OCR processing state of a single document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrStatus {
    Pending,
    Completed,
    Failed,
}

/// A document attached to a claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDocument {
    /// Unique identifier
    pub id: DocumentId,
    /// Opaque reference to the stored image/PDF
    pub file_ref: String,
    /// Detected or declared document type label
    pub document_type: Option<String>,
    /// OCR processing state
    pub ocr_status: OcrStatus,
    /// Extracted text, once OCR completes
    pub ocr_text: Option<String>,
    /// OCR confidence 0-100
    pub ocr_confidence: Option<u8>,
    /// Image quality score 0-100
    pub quality_score: Option<u8>,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
}

impl ClaimDocument {
    /// Creates a freshly uploaded document pending OCR
    pub fn new(file_ref: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new_v7(),
            file_ref: file_ref.into(),
            document_type: None,
            ocr_status: OcrStatus::Pending,
            ocr_text: None,
            ocr_confidence: None,
            quality_score: None,
            uploaded_at: Utc::now(),
        }
    }
}

/// One billed procedure line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureLine {
    /// CPT procedure code
    pub code: String,
    /// Optional billing modifiers (two characters each)
    pub modifiers: Vec<String>,
    /// Billed charge for this line
    pub charge: Money,
}

impl ProcedureLine {
    pub fn new(code: impl Into<String>, charge: Money) -> Self {
        Self {
            code: code.into(),
            modifiers: Vec::new(),
            charge,
        }
    }
}

/// A claim moving through the intake pipeline
///
/// The typed fields (member id, NPI, dates) are filled from extracted fields
/// through the explicit mapping in [`crate::extraction::project_fields`];
/// validators read the typed fields, never raw labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Human-facing claim number
    pub claim_number: String,
    /// Subscriber/member identifier
    pub member_id: Option<String>,
    /// Patient date of birth
    pub patient_dob: Option<NaiveDate>,
    /// Patient gender as billed
    pub patient_gender: Option<Gender>,
    /// Rendering provider NPI
    pub provider_npi: Option<String>,
    /// Prior authorization number, if obtained
    pub prior_auth_number: Option<String>,
    /// Date of service
    pub date_of_service: Option<NaiveDate>,
    /// ICD-10 diagnosis codes
    pub diagnosis_codes: Vec<String>,
    /// Billed procedure lines
    pub procedures: Vec<ProcedureLine>,
    /// Attached documents
    pub documents: Vec<ClaimDocument>,
    /// Fields extracted by the AI service
    pub extracted_fields: Vec<ExtractedField>,
    /// Current live set of validation checks
    pub checks: Vec<ValidationCheck>,
    /// Status
    pub status: ClaimStatus,
    /// Routing confidence score 0-100, once computed
    pub confidence_score: Option<u8>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Creates a newly received claim with no extracted data yet
    pub fn received(claim_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ClaimId::new_v7(),
            claim_number: claim_number.into(),
            member_id: None,
            patient_dob: None,
            patient_gender: None,
            provider_npi: None,
            prior_auth_number: None,
            date_of_service: None,
            diagnosis_codes: Vec::new(),
            procedures: Vec::new(),
            documents: Vec::new(),
            extracted_fields: Vec::new(),
            checks: Vec::new(),
            status: ClaimStatus::Received,
            confidence_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total billed charges across all procedure lines
    ///
    /// Lines are billed in USD; a mixed-currency claim is a data error and
    /// is surfaced as such.
    pub fn total_charges(&self) -> Result<Money, ClaimError> {
        Money::sum(self.procedures.iter().map(|p| &p.charge), Currency::USD)
            .map_err(|e| ClaimError::InvalidCharges(e.to_string()))
    }

    /// Procedure codes billed on this claim
    pub fn procedure_codes(&self) -> Vec<&str> {
        self.procedures.iter().map(|p| p.code.as_str()).collect()
    }

    /// Type labels of all attached documents that have one
    pub fn document_type_labels(&self) -> Vec<String> {
        self.documents
            .iter()
            .filter_map(|d| d.document_type.clone())
            .collect()
    }

    /// Updates the status, validating the transition
    pub fn update_status(&mut self, status: ClaimStatus) -> Result<(), ClaimError> {
        if !self.can_transition_to(status) {
            return Err(ClaimError::InvalidStatusTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", status),
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        if self.status == target {
            return true;
        }
        matches!(
            (self.status, target),
            (Received, Processing)
                | (Processing, Exception)
                | (Processing, HumanReview)
                | (Processing, Submitted)
                | (Processing, Failed)
                | (Exception, Processing)
                | (HumanReview, Processing)
                | (Failed, Processing)
        )
    }
}

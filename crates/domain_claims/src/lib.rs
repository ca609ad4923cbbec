//! Claims Intake Domain Model
//!
//! This crate holds the data model shared by every stage of the validation
//! pipeline: the claim snapshot with its documents and billed lines, fields
//! extracted by the AI service, the validation checks produced by the
//! validators and rules engine, and healthcare code format validation.
//!
//! # Claim Lifecycle
//!
//! ```text
//! Received -> Processing -> Submitted
//!                        -> Exception / HumanReview -> Processing (revalidate)
//!                        -> Failed
//! ```

pub mod claim;
pub mod extraction;
pub mod check;
pub mod codes;
pub mod error;

pub use claim::{Claim, ClaimDocument, ClaimStatus, Gender, OcrStatus, ProcedureLine};
pub use extraction::{ExtractedField, FieldCategory, FieldIndex, project_fields};
pub use check::{CheckCategory, CheckStatus, ValidationCheck, overall_status};
pub use error::ClaimError;

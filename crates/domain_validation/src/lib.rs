//! Domain Validators
//!
//! The three hard-coded validators the pipeline runs against every claim:
//! eligibility, code validation, and document completeness. Each validator
//! is pure and independently callable (the intake dashboard uses them for
//! manual re-validation); the orchestrator persists their checks and the
//! router consumes their structured outcomes.
//!
//! Declarative payer-specific policy belongs in `domain_rules`; the logic
//! here is the fixed baseline every claim gets.

pub mod eligibility;
pub mod codes;
pub mod documents;

use domain_claims::{overall_status, CheckStatus, ValidationCheck};
use serde::{Deserialize, Serialize};

pub use eligibility::{EligibilityChecker, AUTH_REQUIRED_PROCEDURES};
pub use codes::CodeValidator;
pub use documents::{
    DocumentChecker, DocumentCompleteness, DocumentOutcome, DocumentPriority, MissingDocument,
};

/// Structured result of an eligibility or code validation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Individual check results, in the order they were run
    pub checks: Vec<ValidationCheck>,
    /// Fail if any check failed, else warning if any warned, else pass
    pub overall: CheckStatus,
}

impl ValidationOutcome {
    pub fn from_checks(checks: Vec<ValidationCheck>) -> Self {
        let overall = overall_status(&checks);
        Self { checks, overall }
    }
}

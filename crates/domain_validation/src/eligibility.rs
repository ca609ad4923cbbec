//! Eligibility checking
//!
//! Five fixed checks run against every claim. Real payer integrations
//! (270/271 eligibility inquiry) sit behind this; the checks here are the
//! synchronous baseline the pipeline can always compute from claim data.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal_macros::dec;
use tracing::debug;

use core_kernel::Money;
use domain_claims::{CheckCategory, Claim, ValidationCheck};

use crate::ValidationOutcome;

/// Procedure codes that require prior authorization
pub const AUTH_REQUIRED_PROCEDURES: [&str; 4] = ["27447", "29881", "70553", "93458"];

/// Expected authorization number format, e.g. "AUTH-2024-000123"
static AUTH_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^AUTH-\d{4}-\d{6}$").expect("valid pattern"));

/// Single-line charge above this amount triggers a benefits warning
static HIGH_CHARGE_THRESHOLD: Lazy<Money> = Lazy::new(|| Money::usd(dec!(10000)));

#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityChecker;

impl EligibilityChecker {
    pub fn new() -> Self {
        Self
    }

    /// Runs all five eligibility checks against a claim snapshot
    pub fn check(&self, claim: &Claim) -> ValidationOutcome {
        let checks = vec![
            self.coverage_active(claim),
            self.provider_network(claim),
            self.prior_authorization(claim),
            self.deductible_status(),
            self.benefits_verification(claim),
        ];
        let outcome = ValidationOutcome::from_checks(checks);
        debug!(claim_id = %claim.id, overall = ?outcome.overall, "eligibility checked");
        outcome
    }

    fn coverage_active(&self, claim: &Claim) -> ValidationCheck {
        match claim.member_id.as_deref() {
            Some(member_id) if !member_id.is_empty() => ValidationCheck::pass(
                CheckCategory::Eligibility,
                "coverage_active",
                "Member coverage is active",
            ),
            _ => ValidationCheck::fail(
                CheckCategory::Eligibility,
                "coverage_active",
                "Member coverage is active",
                "Member ID is missing",
            ),
        }
    }

    fn provider_network(&self, claim: &Claim) -> ValidationCheck {
        let name = "provider_network";
        let description = "Rendering provider is in network";
        match claim.provider_npi.as_deref() {
            None => ValidationCheck::warning(
                CheckCategory::Eligibility,
                name,
                description,
                "Provider NPI not provided; network status unknown",
            ),
            Some(npi) if npi.len() != 10 || !npi.bytes().all(|b| b.is_ascii_digit()) => {
                ValidationCheck::fail(
                    CheckCategory::Eligibility,
                    name,
                    description,
                    format!("Provider NPI '{npi}' is not a 10-digit identifier"),
                )
            }
            Some(_) => ValidationCheck::pass(CheckCategory::Eligibility, name, description),
        }
    }

    fn prior_authorization(&self, claim: &Claim) -> ValidationCheck {
        let name = "prior_authorization";
        let description = "Prior authorization obtained where required";

        let requires_auth: Vec<&str> = claim
            .procedure_codes()
            .into_iter()
            .filter(|code| AUTH_REQUIRED_PROCEDURES.contains(code))
            .collect();

        if requires_auth.is_empty() {
            return ValidationCheck::pass(CheckCategory::Eligibility, name, description);
        }

        match claim.prior_auth_number.as_deref() {
            None => ValidationCheck::fail(
                CheckCategory::Eligibility,
                name,
                description,
                format!(
                    "Prior authorization required for procedure(s) {} but none provided",
                    requires_auth.join(", ")
                ),
            ),
            Some(auth) if !AUTH_NUMBER_PATTERN.is_match(auth) => ValidationCheck::warning(
                CheckCategory::Eligibility,
                name,
                description,
                format!("Authorization number '{auth}' does not match the expected format"),
            ),
            Some(_) => ValidationCheck::pass(CheckCategory::Eligibility, name, description),
        }
    }

    // Deductible lookup needs the member's accumulator from the payer; until
    // that integration lands this check is informational only.
    fn deductible_status(&self) -> ValidationCheck {
        ValidationCheck::pending(
            CheckCategory::Eligibility,
            "deductible_status",
            "Member deductible status",
            "Deductible accumulator not available at intake",
        )
    }

    fn benefits_verification(&self, claim: &Claim) -> ValidationCheck {
        let name = "benefits_verification";
        let description = "Billed charges within expected benefit limits";

        let high_line = claim
            .procedures
            .iter()
            .find(|p| p.charge.exceeds(&HIGH_CHARGE_THRESHOLD));

        match high_line {
            Some(line) => ValidationCheck::warning(
                CheckCategory::Eligibility,
                name,
                description,
                format!(
                    "Procedure {} billed at {} exceeds the benefit review threshold",
                    line.code, line.charge
                ),
            ),
            None => ValidationCheck::pass(CheckCategory::Eligibility, name, description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_claims::{CheckStatus, ProcedureLine};

    fn eligible_claim() -> Claim {
        let mut claim = Claim::received("CLM-1000");
        claim.member_id = Some("MBR-1001".to_string());
        claim.provider_npi = Some("1234567893".to_string());
        claim
            .procedures
            .push(ProcedureLine::new("99213", Money::usd(dec!(150))));
        claim
    }

    fn check_by_name<'a>(outcome: &'a ValidationOutcome, name: &str) -> &'a ValidationCheck {
        outcome
            .checks
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("missing check {name}"))
    }

    #[test]
    fn test_clean_claim_passes() {
        let outcome = EligibilityChecker::new().check(&eligible_claim());
        assert_eq!(outcome.overall, CheckStatus::Pass);
        assert_eq!(outcome.checks.len(), 5);
    }

    #[test]
    fn test_missing_member_id_fails_coverage() {
        let mut claim = eligible_claim();
        claim.member_id = None;

        let outcome = EligibilityChecker::new().check(&claim);
        let check = check_by_name(&outcome, "coverage_active");
        assert_eq!(check.status, CheckStatus::Fail);
        assert!(check.details.as_deref().unwrap().contains("Member ID is missing"));
        assert_eq!(outcome.overall, CheckStatus::Fail);
    }

    #[test]
    fn test_missing_npi_warns_and_malformed_npi_fails() {
        let mut claim = eligible_claim();
        claim.provider_npi = None;
        let outcome = EligibilityChecker::new().check(&claim);
        assert_eq!(
            check_by_name(&outcome, "provider_network").status,
            CheckStatus::Warning
        );

        claim.provider_npi = Some("12345".to_string());
        let outcome = EligibilityChecker::new().check(&claim);
        assert_eq!(
            check_by_name(&outcome, "provider_network").status,
            CheckStatus::Fail
        );
    }

    #[test]
    fn test_prior_auth_required_and_missing_fails() {
        let mut claim = eligible_claim();
        claim
            .procedures
            .push(ProcedureLine::new("27447", Money::usd(dec!(8000))));

        let outcome = EligibilityChecker::new().check(&claim);
        let check = check_by_name(&outcome, "prior_authorization");
        assert_eq!(check.status, CheckStatus::Fail);
        assert!(check.details.as_deref().unwrap().contains("27447"));
    }

    #[test]
    fn test_prior_auth_malformed_number_warns() {
        let mut claim = eligible_claim();
        claim
            .procedures
            .push(ProcedureLine::new("27447", Money::usd(dec!(8000))));
        claim.prior_auth_number = Some("A-12".to_string());

        let outcome = EligibilityChecker::new().check(&claim);
        assert_eq!(
            check_by_name(&outcome, "prior_authorization").status,
            CheckStatus::Warning
        );

        claim.prior_auth_number = Some("AUTH-2024-000123".to_string());
        let outcome = EligibilityChecker::new().check(&claim);
        assert_eq!(
            check_by_name(&outcome, "prior_authorization").status,
            CheckStatus::Pass
        );
    }

    #[test]
    fn test_high_single_charge_warns_benefits() {
        let mut claim = eligible_claim();
        claim
            .procedures
            .push(ProcedureLine::new("33533", Money::usd(dec!(25000))));

        let outcome = EligibilityChecker::new().check(&claim);
        let check = check_by_name(&outcome, "benefits_verification");
        assert_eq!(check.status, CheckStatus::Warning);
        assert!(check.details.as_deref().unwrap().contains("33533"));
    }

    #[test]
    fn test_deductible_is_informational() {
        let outcome = EligibilityChecker::new().check(&eligible_claim());
        assert_eq!(
            check_by_name(&outcome, "deductible_status").status,
            CheckStatus::Pending
        );
    }
}

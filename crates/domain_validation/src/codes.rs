//! Procedure and diagnosis code validation
//!
//! Format checks plus the clinical edit tables: medical necessity,
//! age restrictions, gender restrictions, and bundled-pair detection.
//! The tables here are a fixed starter set; payer-specific edits are
//! expressed as declarative business rules instead.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::debug;

use domain_claims::{codes, CheckCategory, Claim, Gender, ValidationCheck};

use crate::ValidationOutcome;

/// Diagnosis code to the procedures it supports
static MEDICAL_NECESSITY: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        ("M17.11", &["27447", "27446", "29881"] as &[&str]),
        ("M17.12", &["27447", "27446", "29881"]),
        ("M23.21", &["29881", "29877"]),
        ("I25.10", &["93458", "92928"]),
        ("G89.29", &["70553"]),
    ])
});

/// High-cost procedures for which medical necessity is enforced; everything
/// else passes the necessity check unconditionally
const MAJOR_PROCEDURES: [&str; 4] = ["27447", "29881", "93458", "70553"];

/// Procedure code to (minimum age, maximum age) in years, inclusive
static AGE_RESTRICTIONS: Lazy<HashMap<&'static str, (Option<u32>, Option<u32>)>> =
    Lazy::new(|| {
        HashMap::from([
            ("27447", (Some(18), None)),
            ("99397", (Some(65), None)),
            ("90460", (None, Some(18))),
        ])
    });

/// Procedure code to the only gender it may be billed for
static GENDER_RESTRICTIONS: Lazy<HashMap<&'static str, Gender>> = Lazy::new(|| {
    HashMap::from([
        ("59400", Gender::Female),
        ("58150", Gender::Female),
        ("55700", Gender::Male),
        ("55250", Gender::Male),
    ])
});

/// Procedure pairs that should not be billed together on one claim
const BUNDLED_PAIRS: [(&str, &str); 2] = [("80048", "80053"), ("29877", "29881")];

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeValidator;

impl CodeValidator {
    pub fn new() -> Self {
        Self
    }

    /// Runs every code check against a claim snapshot
    pub fn validate(&self, claim: &Claim) -> ValidationOutcome {
        let mut checks = Vec::new();

        self.diagnosis_formats(claim, &mut checks);
        self.procedure_formats(claim, &mut checks);
        self.medical_necessity(claim, &mut checks);
        self.age_restrictions(claim, &mut checks);
        self.gender_restrictions(claim, &mut checks);
        self.bundling(claim, &mut checks);

        let outcome = ValidationOutcome::from_checks(checks);
        debug!(claim_id = %claim.id, overall = ?outcome.overall, "codes validated");
        outcome
    }

    fn diagnosis_formats(&self, claim: &Claim, checks: &mut Vec<ValidationCheck>) {
        for code in &claim.diagnosis_codes {
            let check = if codes::is_valid_icd10(code) {
                ValidationCheck::pass(
                    CheckCategory::Code,
                    "icd10_format",
                    format!("Diagnosis code {code} is a valid ICD-10 code"),
                )
            } else {
                ValidationCheck::fail(
                    CheckCategory::Code,
                    "icd10_format",
                    format!("Diagnosis code {code} is a valid ICD-10 code"),
                    format!("'{code}' does not match the ICD-10 format"),
                )
            };
            checks.push(check);
        }
    }

    fn procedure_formats(&self, claim: &Claim, checks: &mut Vec<ValidationCheck>) {
        for line in &claim.procedures {
            let code = &line.code;
            if !codes::is_valid_cpt(code) {
                checks.push(ValidationCheck::fail(
                    CheckCategory::Code,
                    "cpt_format",
                    format!("Procedure code {code} is a valid CPT code"),
                    format!("'{code}' does not match the CPT format"),
                ));
                continue;
            }

            let bad_modifier = line
                .modifiers
                .iter()
                .find(|m| !codes::is_valid_cpt_modifier(m));
            match bad_modifier {
                Some(modifier) => checks.push(ValidationCheck::fail(
                    CheckCategory::Code,
                    "cpt_format",
                    format!("Procedure code {code} is a valid CPT code"),
                    format!("Modifier '{modifier}' on {code} is not a valid two-character modifier"),
                )),
                None => checks.push(ValidationCheck::pass(
                    CheckCategory::Code,
                    "cpt_format",
                    format!("Procedure code {code} is a valid CPT code"),
                )),
            }
        }
    }

    /// Necessity is only enforced for major procedures: the claim must carry
    /// at least one diagnosis whose allowed-procedure list includes the code
    fn medical_necessity(&self, claim: &Claim, checks: &mut Vec<ValidationCheck>) {
        for code in claim.procedure_codes() {
            if !MAJOR_PROCEDURES.contains(&code) {
                continue;
            }
            let supported = claim.diagnosis_codes.iter().any(|dx| {
                MEDICAL_NECESSITY
                    .get(dx.as_str())
                    .is_some_and(|allowed| allowed.contains(&code))
            });
            let check = if supported {
                ValidationCheck::pass(
                    CheckCategory::Code,
                    "medical_necessity",
                    format!("Procedure {code} is supported by a billed diagnosis"),
                )
            } else {
                ValidationCheck::fail(
                    CheckCategory::Code,
                    "medical_necessity",
                    format!("Procedure {code} is supported by a billed diagnosis"),
                    format!("No billed diagnosis supports procedure {code}"),
                )
            };
            checks.push(check);
        }
    }

    fn age_restrictions(&self, claim: &Claim, checks: &mut Vec<ValidationCheck>) {
        let (Some(dob), Some(dos)) = (claim.patient_dob, claim.date_of_service) else {
            return;
        };
        let age_years = (dos - dob).num_days() as f64 / 365.25;

        for code in claim.procedure_codes() {
            let Some(&(min, max)) = AGE_RESTRICTIONS.get(code) else {
                continue;
            };
            let too_young = min.is_some_and(|m| age_years < m as f64);
            let too_old = max.is_some_and(|m| age_years > m as f64);
            let check = if too_young || too_old {
                ValidationCheck::fail(
                    CheckCategory::Code,
                    "age_restriction",
                    format!("Patient age is appropriate for procedure {code}"),
                    format!(
                        "Patient age {:.0} is outside the allowed range for procedure {code}",
                        age_years
                    ),
                )
            } else {
                ValidationCheck::pass(
                    CheckCategory::Code,
                    "age_restriction",
                    format!("Patient age is appropriate for procedure {code}"),
                )
            };
            checks.push(check);
        }
    }

    fn gender_restrictions(&self, claim: &Claim, checks: &mut Vec<ValidationCheck>) {
        let Some(gender) = claim.patient_gender else {
            return;
        };
        if gender == Gender::Unknown {
            return;
        }

        for code in claim.procedure_codes() {
            let Some(&required) = GENDER_RESTRICTIONS.get(code) else {
                continue;
            };
            let check = if gender == required {
                ValidationCheck::pass(
                    CheckCategory::Code,
                    "gender_restriction",
                    format!("Patient gender is appropriate for procedure {code}"),
                )
            } else {
                ValidationCheck::fail(
                    CheckCategory::Code,
                    "gender_restriction",
                    format!("Patient gender is appropriate for procedure {code}"),
                    format!("Procedure {code} is restricted to {required:?} patients"),
                )
            };
            checks.push(check);
        }
    }

    fn bundling(&self, claim: &Claim, checks: &mut Vec<ValidationCheck>) {
        let billed = claim.procedure_codes();
        for (a, b) in BUNDLED_PAIRS {
            if billed.contains(&a) && billed.contains(&b) {
                checks.push(ValidationCheck::warning(
                    CheckCategory::Code,
                    "bundled_codes",
                    format!("Procedures {a} and {b} are billed separately"),
                    format!("{a} is typically bundled into {b}; review before submission"),
                ));
            }
        }
    }
}

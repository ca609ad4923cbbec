//! Validation check results
//!
//! Every validator and every rules-engine pass produces `ValidationCheck`
//! records. The full set for a claim is replaced per category on each
//! validation pass, so at most one live set exists at a time.

use serde::{Deserialize, Serialize};

/// Category of a validation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Eligibility,
    Code,
    BusinessRule,
    Document,
}

/// Outcome of a single validation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
    /// Informational placeholder; never affects the overall status
    Pending,
}

/// A single validation check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationCheck {
    /// Check category
    pub category: CheckCategory,
    /// Stable machine name (e.g., "coverage_active")
    pub name: String,
    /// Human-readable description of what was checked
    pub description: String,
    /// Outcome
    pub status: CheckStatus,
    /// Outcome detail, shown to reviewers
    pub details: Option<String>,
}

impl ValidationCheck {
    pub fn new(
        category: CheckCategory,
        name: impl Into<String>,
        description: impl Into<String>,
        status: CheckStatus,
        details: Option<String>,
    ) -> Self {
        Self {
            category,
            name: name.into(),
            description: description.into(),
            status,
            details,
        }
    }

    /// Creates a passing check
    pub fn pass(
        category: CheckCategory,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(category, name, description, CheckStatus::Pass, None)
    }

    /// Creates a failing check with details
    pub fn fail(
        category: CheckCategory,
        name: impl Into<String>,
        description: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(category, name, description, CheckStatus::Fail, Some(details.into()))
    }

    /// Creates a warning check with details
    pub fn warning(
        category: CheckCategory,
        name: impl Into<String>,
        description: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(
            category,
            name,
            description,
            CheckStatus::Warning,
            Some(details.into()),
        )
    }

    /// Creates an informational pending check
    pub fn pending(
        category: CheckCategory,
        name: impl Into<String>,
        description: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(
            category,
            name,
            description,
            CheckStatus::Pending,
            Some(details.into()),
        )
    }

    pub fn is_fail(&self) -> bool {
        self.status == CheckStatus::Fail
    }

    pub fn is_warning(&self) -> bool {
        self.status == CheckStatus::Warning
    }
}

/// Folds a set of checks into an overall status
///
/// Fail dominates, then warning, then pass. Pending checks are
/// informational and do not participate.
pub fn overall_status(checks: &[ValidationCheck]) -> CheckStatus {
    if checks.iter().any(ValidationCheck::is_fail) {
        CheckStatus::Fail
    } else if checks.iter().any(ValidationCheck::is_warning) {
        CheckStatus::Warning
    } else {
        CheckStatus::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_status_fail_dominates() {
        let checks = vec![
            ValidationCheck::pass(CheckCategory::Eligibility, "a", "a"),
            ValidationCheck::warning(CheckCategory::Eligibility, "b", "b", "w"),
            ValidationCheck::fail(CheckCategory::Eligibility, "c", "c", "f"),
        ];
        assert_eq!(overall_status(&checks), CheckStatus::Fail);
    }

    #[test]
    fn test_overall_status_warning_over_pass() {
        let checks = vec![
            ValidationCheck::pass(CheckCategory::Code, "a", "a"),
            ValidationCheck::warning(CheckCategory::Code, "b", "b", "w"),
        ];
        assert_eq!(overall_status(&checks), CheckStatus::Warning);
    }

    #[test]
    fn test_overall_status_pending_is_ignored() {
        let checks = vec![
            ValidationCheck::pass(CheckCategory::Eligibility, "a", "a"),
            ValidationCheck::pending(CheckCategory::Eligibility, "b", "b", "info"),
        ];
        assert_eq!(overall_status(&checks), CheckStatus::Pass);
    }

    #[test]
    fn test_overall_status_empty_is_pass() {
        assert_eq!(overall_status(&[]), CheckStatus::Pass);
    }
}

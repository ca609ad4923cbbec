//! Routing issues derived from check results

use serde::{Deserialize, Serialize};

use domain_claims::CheckCategory;
use domain_validation::DocumentPriority;

/// Severity of a routing issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSeverity {
    High,
    Medium,
    Low,
    /// Advisory; counted separately from the graded severities
    Warning,
}

/// Which part of validation raised the issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Eligibility,
    Coding,
    Compliance,
    Documentation,
}

impl From<CheckCategory> for IssueCategory {
    fn from(category: CheckCategory) -> Self {
        match category {
            CheckCategory::Eligibility => IssueCategory::Eligibility,
            CheckCategory::Code => IssueCategory::Coding,
            CheckCategory::BusinessRule => IssueCategory::Compliance,
            CheckCategory::Document => IssueCategory::Documentation,
        }
    }
}

/// One actionable problem standing between a claim and submission
///
/// Derived from checks on every routing pass, never persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingIssue {
    pub severity: IssueSeverity,
    pub category: IssueCategory,
    /// What is wrong
    pub issue: String,
    /// What a biller should do about it
    pub recommendation: String,
}

impl RoutingIssue {
    pub fn new(
        severity: IssueSeverity,
        category: IssueCategory,
        issue: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            issue: issue.into(),
            recommendation: recommendation.into(),
        }
    }
}

impl From<DocumentPriority> for IssueSeverity {
    fn from(priority: DocumentPriority) -> Self {
        match priority {
            DocumentPriority::High => IssueSeverity::High,
            DocumentPriority::Medium => IssueSeverity::Medium,
            DocumentPriority::Low => IssueSeverity::Low,
        }
    }
}

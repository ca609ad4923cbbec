//! Routing decision logic

use once_cell::sync::Lazy;
use rust_decimal_macros::dec;
use tracing::info;

use core_kernel::Money;
use domain_claims::{CheckStatus, ValidationCheck};
use domain_validation::{DocumentOutcome, ValidationOutcome};

use crate::decision::{QueueAssignment, RoutingAction, RoutingDecision, RoutingPriority};
use crate::issue::{IssueCategory, IssueSeverity, RoutingIssue};

/// Claims billed above this total never auto-submit
static HIGH_VALUE_THRESHOLD: Lazy<Money> = Lazy::new(|| Money::usd(dec!(10000)));

const CLEAN_CONFIDENCE_FLOOR: i32 = 95;
const EXCEPTION_WARNING_CAP: usize = 2;

// Confidence penalties per failing/warning check
const ELIGIBILITY_FAIL_PENALTY: i32 = 20;
const ELIGIBILITY_WARN_PENALTY: i32 = 5;
const CODE_FAIL_PENALTY: i32 = 15;
const CODE_WARN_PENALTY: i32 = 3;
const RULE_FAIL_PENALTY: i32 = 15;
const RULE_WARN_PENALTY: i32 = 3;
const DOC_HIGH_PENALTY: i32 = 10;
const DOC_MEDIUM_PENALTY: i32 = 5;
const DOC_LOW_PENALTY: i32 = 2;

/// Everything the router needs to decide a claim's fate
pub struct RoutingInputs<'a> {
    pub eligibility: &'a ValidationOutcome,
    pub codes: &'a ValidationOutcome,
    pub documents: &'a DocumentOutcome,
    /// Results of the declarative business-rule pass
    pub rule_checks: &'a [ValidationCheck],
    pub total_charges: Money,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimRouter;

impl ClaimRouter {
    pub fn new() -> Self {
        Self
    }

    /// Computes the routing decision for one claim
    ///
    /// Pure: the same inputs always produce the same decision.
    pub fn route(&self, inputs: &RoutingInputs<'_>) -> RoutingDecision {
        let issues = self.collect_issues(inputs);
        let confidence_score = self.confidence_score(inputs);

        let high = count_severity(&issues, IssueSeverity::High);
        let medium = count_severity(&issues, IssueSeverity::Medium);
        let warnings = count_severity(&issues, IssueSeverity::Warning);
        let within_auto_limit = !inputs.total_charges.exceeds(&HIGH_VALUE_THRESHOLD);

        let decision = if confidence_score >= CLEAN_CONFIDENCE_FLOOR
            && high == 0
            && warnings == 0
            && within_auto_limit
        {
            RoutingDecision {
                queue: QueueAssignment::CleanSubmission,
                action: RoutingAction::AutoSubmit,
                priority: RoutingPriority::Low,
                reason: "All validation checks passed".to_string(),
                confidence_score: clamp_score(confidence_score),
                issues_to_resolve: issues,
                estimated_resolution_time: None,
                auto_corrections: Vec::new(),
            }
        } else if high == 0 && medium == 0 && warnings <= EXCEPTION_WARNING_CAP && within_auto_limit
        {
            let auto_corrections = issues
                .iter()
                .map(|i| format!("Auto-correct: {}", i.issue))
                .collect();
            RoutingDecision {
                queue: QueueAssignment::ExceptionQueue,
                action: RoutingAction::AutoCorrectAndSubmit,
                priority: RoutingPriority::Medium,
                reason: "Minor issues eligible for automatic correction".to_string(),
                confidence_score: clamp_score(confidence_score),
                issues_to_resolve: issues,
                estimated_resolution_time: Some("1-2 hours".to_string()),
                auto_corrections,
            }
        } else {
            let priority = if high > 0 {
                RoutingPriority::High
            } else {
                RoutingPriority::Medium
            };
            let reason = review_reason(&issues, high, inputs, within_auto_limit);
            let estimated = if high > 0 { "24-48 hours" } else { "4-8 hours" };
            RoutingDecision {
                queue: QueueAssignment::HumanReview,
                action: RoutingAction::ManualReviewRequired,
                priority,
                reason,
                confidence_score: clamp_score(confidence_score),
                issues_to_resolve: issues,
                estimated_resolution_time: Some(estimated.to_string()),
                auto_corrections: Vec::new(),
            }
        };

        info!(
            queue = ?decision.queue,
            confidence = decision.confidence_score,
            issues = decision.issues_to_resolve.len(),
            "claim routed"
        );
        decision
    }

    /// Confidence starts at 100 and loses a fixed penalty per failing or
    /// warning check, clamped to [0, 100]
    pub fn confidence_score(&self, inputs: &RoutingInputs<'_>) -> i32 {
        let mut score = 100;

        score -= check_penalties(
            &inputs.eligibility.checks,
            ELIGIBILITY_FAIL_PENALTY,
            ELIGIBILITY_WARN_PENALTY,
        );
        score -= check_penalties(&inputs.codes.checks, CODE_FAIL_PENALTY, CODE_WARN_PENALTY);
        score -= check_penalties(inputs.rule_checks, RULE_FAIL_PENALTY, RULE_WARN_PENALTY);

        for missing in &inputs.documents.missing {
            score -= match IssueSeverity::from(missing.priority) {
                IssueSeverity::High => DOC_HIGH_PENALTY,
                IssueSeverity::Medium => DOC_MEDIUM_PENALTY,
                _ => DOC_LOW_PENALTY,
            };
        }

        score.clamp(0, 100)
    }

    /// Flattens every fail/warning check and missing document into the
    /// issue list shown to billers
    fn collect_issues(&self, inputs: &RoutingInputs<'_>) -> Vec<RoutingIssue> {
        let mut issues = Vec::new();

        check_issues(
            &inputs.eligibility.checks,
            IssueCategory::Eligibility,
            "Verify member eligibility and resubmit",
            &mut issues,
        );
        check_issues(
            &inputs.codes.checks,
            IssueCategory::Coding,
            "Correct the diagnosis/procedure coding",
            &mut issues,
        );
        check_issues(
            inputs.rule_checks,
            IssueCategory::Compliance,
            "Resolve the failed business rule",
            &mut issues,
        );

        for missing in &inputs.documents.missing {
            issues.push(RoutingIssue::new(
                IssueSeverity::from(missing.priority),
                IssueCategory::Documentation,
                format!("Missing required document: {}", missing.document_type),
                missing.reason.clone(),
            ));
        }

        issues
    }
}

fn check_penalties(checks: &[ValidationCheck], fail_penalty: i32, warn_penalty: i32) -> i32 {
    checks
        .iter()
        .map(|c| match c.status {
            CheckStatus::Fail => fail_penalty,
            CheckStatus::Warning => warn_penalty,
            _ => 0,
        })
        .sum()
}

fn check_issues(
    checks: &[ValidationCheck],
    category: IssueCategory,
    fail_recommendation: &str,
    issues: &mut Vec<RoutingIssue>,
) {
    for check in checks {
        let issue_text = check
            .details
            .clone()
            .unwrap_or_else(|| check.description.clone());
        match check.status {
            CheckStatus::Fail => issues.push(RoutingIssue::new(
                IssueSeverity::High,
                category,
                issue_text,
                fail_recommendation,
            )),
            CheckStatus::Warning => issues.push(RoutingIssue::new(
                IssueSeverity::Warning,
                category,
                issue_text,
                "Review before submission",
            )),
            _ => {}
        }
    }
}

fn count_severity(issues: &[RoutingIssue], severity: IssueSeverity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

/// Review reason by precedence: missing documentation, then high-severity
/// issues, then claim value, then a generic catch-all
fn review_reason(
    issues: &[RoutingIssue],
    high: usize,
    inputs: &RoutingInputs<'_>,
    within_auto_limit: bool,
) -> String {
    let missing_docs = issues
        .iter()
        .any(|i| i.category == IssueCategory::Documentation);
    if missing_docs {
        "Missing required documentation must be obtained before submission".to_string()
    } else if high > 0 {
        "High-severity validation issues require manual review".to_string()
    } else if !within_auto_limit {
        format!(
            "High-value claim ({}) requires manual review before submission",
            inputs.total_charges
        )
    } else {
        "Multiple validation issues require manual review".to_string()
    }
}

fn clamp_score(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

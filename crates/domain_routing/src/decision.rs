//! Routing decision types

use serde::{Deserialize, Serialize};

use crate::issue::RoutingIssue;

/// Destination queue for a validated claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueAssignment {
    /// Ready for submission with no human touch
    CleanSubmission,
    /// Minor issues that the auto-correction worker can resolve
    ExceptionQueue,
    /// Needs a biller or coder to look at it
    HumanReview,
}

/// What happens to the claim in its assigned queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingAction {
    AutoSubmit,
    AutoCorrectAndSubmit,
    ManualReviewRequired,
}

/// Work priority within the assigned queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingPriority {
    High,
    Medium,
    Low,
}

/// The routing verdict for one claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub queue: QueueAssignment,
    pub action: RoutingAction,
    pub priority: RoutingPriority,
    /// Operator-facing explanation; the only error surface end users see
    pub reason: String,
    /// 0-100, a pure function of the validator outputs
    pub confidence_score: u8,
    pub issues_to_resolve: Vec<RoutingIssue>,
    /// Present for queues with a service-level expectation
    pub estimated_resolution_time: Option<String>,
    /// Corrections the exception-queue worker will apply automatically
    pub auto_corrections: Vec<String>,
}

impl RoutingDecision {
    /// True when the claim should proceed straight to submission
    pub fn is_clean(&self) -> bool {
        self.queue == QueueAssignment::CleanSubmission
    }
}

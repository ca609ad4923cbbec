//! Claim Routing
//!
//! Turns the validator outcomes for a claim into a confidence score and a
//! deterministic queue assignment: clean submission, the auto-correct
//! exception queue, or human review. Scoring and routing are pure functions
//! of the inputs so a decision can always be recomputed for audit.

pub mod issue;
pub mod decision;
pub mod router;

pub use issue::{IssueCategory, IssueSeverity, RoutingIssue};
pub use decision::{QueueAssignment, RoutingAction, RoutingDecision, RoutingPriority};
pub use router::{ClaimRouter, RoutingInputs};

//! Orchestration errors

use thiserror::Error;

use core_kernel::PortError;
use domain_claims::ClaimError;
use infra_queue::QueueError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No workflow for claim {0}")]
    WorkflowNotFound(String),

    #[error("Stage {stage} failed: {reason}")]
    StageFailed { stage: String, reason: String },

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

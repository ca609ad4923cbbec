//! Audit events
//!
//! Every workflow transition emits an audit event. The sink is a port;
//! production writes them to the audit table, tests collect them in memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AuditEventId, ClaimId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    WorkflowStarted,
    WorkflowResumed,
    WorkflowPaused,
    WorkflowCompleted,
    WorkflowFailed,
    StageCompleted,
    StageSkipped,
    StageFailed,
    ClaimRouted,
    ClaimSubmitted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub claim_id: ClaimId,
    pub event_type: AuditEventType,
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(claim_id: ClaimId, event_type: AuditEventType, detail: impl Into<String>) -> Self {
        Self {
            id: AuditEventId::new_v7(),
            claim_id,
            event_type,
            detail: detail.into(),
            occurred_at: Utc::now(),
        }
    }
}

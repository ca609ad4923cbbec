//! Queue message envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::{ClaimId, MessageId};

/// One message on a queue
///
/// `attempts` counts deliveries: the consumer increments it each time the
/// message is handed to a handler, so a message that dead-letters at a cap
/// of 3 was tried exactly 3 times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMessage {
    pub id: MessageId,
    /// Handler dispatch key, e.g. "ocr_document"
    pub message_type: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub attempts: u32,
    /// Claim this work belongs to, when there is one
    pub claim_id: Option<ClaimId>,
}

impl QueueMessage {
    pub fn new(message_type: impl Into<String>, payload: Value) -> Self {
        Self {
            id: MessageId::new_v7(),
            message_type: message_type.into(),
            payload,
            timestamp: Utc::now(),
            attempts: 0,
            claim_id: None,
        }
    }

    pub fn for_claim(message_type: impl Into<String>, payload: Value, claim_id: ClaimId) -> Self {
        Self {
            claim_id: Some(claim_id),
            ..Self::new(message_type, payload)
        }
    }
}

//! In-memory adapters for the pipeline's ports

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, PortError};
use domain_claims::{Claim, ClaimDocument, ExtractedField};
use orchestration::{
    AuditEvent, AuditEventType, AuditSink, ClaimStore, DocumentAssessment, FieldExtractor,
    OcrService, OcrText, Workflow, WorkflowStatus,
};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Store backed by hash maps
#[derive(Default)]
pub struct InMemoryClaimStore {
    claims: Mutex<HashMap<ClaimId, Claim>>,
    workflows: Mutex<HashMap<ClaimId, Workflow>>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a claim and returns its id
    pub fn seed(&self, claim: Claim) -> ClaimId {
        let id = claim.id;
        lock(&self.claims).insert(id, claim);
        id
    }

    pub fn seed_workflow(&self, workflow: Workflow) {
        lock(&self.workflows).insert(workflow.claim_id, workflow);
    }

    pub fn claim(&self, id: ClaimId) -> Option<Claim> {
        lock(&self.claims).get(&id).cloned()
    }

    pub fn workflow(&self, claim_id: ClaimId) -> Option<Workflow> {
        lock(&self.workflows).get(&claim_id).cloned()
    }
}

impl DomainPort for InMemoryClaimStore {}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn load_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
        lock(&self.claims)
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Claim", id))
    }

    async fn save_claim(&self, claim: &Claim) -> Result<(), PortError> {
        lock(&self.claims).insert(claim.id, claim.clone());
        Ok(())
    }

    async fn save_workflow(&self, workflow: &Workflow) -> Result<(), PortError> {
        lock(&self.workflows).insert(workflow.claim_id, workflow.clone());
        Ok(())
    }

    async fn load_workflow(&self, claim_id: ClaimId) -> Result<Option<Workflow>, PortError> {
        Ok(lock(&self.workflows).get(&claim_id).cloned())
    }

    async fn open_workflows(&self) -> Result<Vec<Workflow>, PortError> {
        Ok(lock(&self.workflows)
            .values()
            .filter(|w| {
                matches!(w.status, WorkflowStatus::Running | WorkflowStatus::Paused)
            })
            .cloned()
            .collect())
    }
}

/// Scripted OCR service
pub struct MockOcrService {
    /// When set, every extract_text call fails
    failing: bool,
    /// Artificial latency per call, for pause/resume timing tests
    delay: Option<Duration>,
    text: String,
}

impl Default for MockOcrService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOcrService {
    pub fn new() -> Self {
        Self {
            failing: false,
            delay: None,
            text: "CMS-1500 HEALTH INSURANCE CLAIM FORM".to_string(),
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl DomainPort for MockOcrService {}

#[async_trait]
impl OcrService for MockOcrService {
    async fn assess(&self, _document: &ClaimDocument) -> Result<DocumentAssessment, PortError> {
        Ok(DocumentAssessment {
            quality_score: 88,
            document_type: Some("cms_1500".to_string()),
        })
    }

    async fn extract_text(&self, document: &ClaimDocument) -> Result<OcrText, PortError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(PortError::unavailable(format!(
                "ocr for {}",
                document.file_ref
            )));
        }
        Ok(OcrText {
            text: self.text.clone(),
            confidence: 92,
        })
    }
}

/// Field extractor that returns a fixed field set per document
pub struct MockFieldExtractor {
    fields: Vec<ExtractedField>,
    failing: bool,
}

impl Default for MockFieldExtractor {
    fn default() -> Self {
        Self {
            fields: crate::fixtures::standard_extracted_fields(),
            failing: false,
        }
    }
}

impl MockFieldExtractor {
    pub fn returning(fields: Vec<ExtractedField>) -> Self {
        Self {
            fields,
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fields: Vec::new(),
            failing: true,
        }
    }
}

impl DomainPort for MockFieldExtractor {}

#[async_trait]
impl FieldExtractor for MockFieldExtractor {
    async fn extract_fields(
        &self,
        _claim: &Claim,
        document: &ClaimDocument,
    ) -> Result<Vec<ExtractedField>, PortError> {
        if self.failing {
            return Err(PortError::unavailable(format!(
                "extraction for {}",
                document.file_ref
            )));
        }
        Ok(self.fields.clone())
    }
}

/// Collects audit events in memory
#[derive(Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        lock(&self.events).clone()
    }

    pub fn has_event(&self, claim_id: ClaimId, event_type: AuditEventType) -> bool {
        lock(&self.events)
            .iter()
            .any(|e| e.claim_id == claim_id && e.event_type == event_type)
    }
}

impl DomainPort for InMemoryAuditSink {}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), PortError> {
        lock(&self.events).push(event);
        Ok(())
    }
}

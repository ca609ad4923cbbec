//! Ports to the pipeline's external collaborators
//!
//! The store, OCR service, and AI field extractor are external systems;
//! the orchestrator only ever sees these traits. Adapters live outside
//! this crate (tests use the in-memory ones from `test_utils`).

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, PortError};
use domain_claims::{Claim, ClaimDocument, ExtractedField};

use crate::audit::AuditEvent;
use crate::workflow::Workflow;

/// Durable claim and workflow state
#[async_trait]
pub trait ClaimStore: DomainPort {
    async fn load_claim(&self, id: ClaimId) -> Result<Claim, PortError>;

    async fn save_claim(&self, claim: &Claim) -> Result<(), PortError>;

    /// Persists the workflow snapshot; called on every stage transition
    async fn save_workflow(&self, workflow: &Workflow) -> Result<(), PortError>;

    async fn load_workflow(&self, claim_id: ClaimId) -> Result<Option<Workflow>, PortError>;

    /// Workflows that were running or paused at last save; used to resume
    /// in-flight work after a restart
    async fn open_workflows(&self) -> Result<Vec<Workflow>, PortError>;
}

/// Quality/type assessment of an uploaded document image
#[derive(Debug, Clone)]
pub struct DocumentAssessment {
    /// Image quality 0-100
    pub quality_score: u8,
    /// Detected form type label, e.g. "cms_1500", when recognizable
    pub document_type: Option<String>,
}

/// Text extracted from one document
#[derive(Debug, Clone)]
pub struct OcrText {
    pub text: String,
    /// Extraction confidence 0-100
    pub confidence: u8,
}

/// The OCR service
#[async_trait]
pub trait OcrService: DomainPort {
    /// Assesses image quality and detects the form type
    async fn assess(&self, document: &ClaimDocument) -> Result<DocumentAssessment, PortError>;

    /// Extracts the document's text
    async fn extract_text(&self, document: &ClaimDocument) -> Result<OcrText, PortError>;
}

/// The AI field-extraction service; an opaque external collaborator
#[async_trait]
pub trait FieldExtractor: DomainPort {
    /// Pulls structured fields out of a document's OCR text
    async fn extract_fields(
        &self,
        claim: &Claim,
        document: &ClaimDocument,
    ) -> Result<Vec<ExtractedField>, PortError>;
}

/// Destination for audit events
#[async_trait]
pub trait AuditSink: DomainPort {
    async fn record(&self, event: AuditEvent) -> Result<(), PortError>;
}

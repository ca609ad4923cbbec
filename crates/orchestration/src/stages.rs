//! Stage execution
//!
//! One function per pipeline stage, dispatched by [`StageRunner::run`].
//! Synchronous stages (validation, routing) call the domain crates
//! directly; the OCR and AI-extraction stages hand work to queue consumers
//! and await the job outcomes.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use core_kernel::{ClaimId, DocumentId, PortError};
use domain_claims::{
    project_fields, CheckCategory, Claim, ClaimStatus, OcrStatus, ValidationCheck,
};
use domain_routing::{ClaimRouter, RoutingDecision, RoutingInputs};
use domain_rules::{RuleContext, RulesEngine};
use domain_validation::{CodeValidator, DocumentChecker, EligibilityChecker};
use infra_queue::{JobOutcome, MessageHandler, QueueClient, QueueMessage};

use crate::audit::{AuditEvent, AuditEventType};
use crate::config::PipelineConfig;
use crate::error::WorkflowError;
use crate::ports::{AuditSink, ClaimStore, FieldExtractor, OcrService};
use crate::workflow::StageName;

/// Result of executing one stage
pub enum StageOutcome {
    Completed(Option<Value>),
    /// Nothing to do; carries the explanation recorded on the stage
    Skipped(String),
    /// The routing stage decided the claim is not clean: the workflow
    /// completes here and submission is skipped
    Terminate(Value),
}

/// Executes the domain action of each pipeline stage
pub struct StageRunner {
    store: Arc<dyn ClaimStore>,
    ocr: Arc<dyn OcrService>,
    queue: Arc<QueueClient>,
    rules: Arc<RwLock<RulesEngine>>,
    eligibility: EligibilityChecker,
    codes: CodeValidator,
    documents: DocumentChecker,
    router: ClaimRouter,
    audit: Arc<dyn AuditSink>,
    config: PipelineConfig,
}

impl StageRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ClaimStore>,
        ocr: Arc<dyn OcrService>,
        queue: Arc<QueueClient>,
        rules: Arc<RwLock<RulesEngine>>,
        audit: Arc<dyn AuditSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            ocr,
            queue,
            rules,
            eligibility: EligibilityChecker::new(),
            codes: CodeValidator::new(),
            documents: DocumentChecker::new(),
            router: ClaimRouter::new(),
            audit,
            config,
        }
    }

    pub async fn run(
        &self,
        claim_id: ClaimId,
        stage: StageName,
    ) -> Result<StageOutcome, WorkflowError> {
        match stage {
            StageName::Intake => self.intake(claim_id).await,
            StageName::DocumentProcessing => self.document_processing(claim_id).await,
            StageName::OcrExtraction => self.ocr_extraction(claim_id).await,
            StageName::AiFieldExtraction => self.ai_field_extraction(claim_id).await,
            StageName::EligibilityCheck => self.eligibility_check(claim_id).await,
            StageName::CodeValidation => self.code_validation(claim_id).await,
            StageName::BusinessRules => self.business_rules(claim_id).await,
            StageName::DocumentCheck => self.document_check(claim_id).await,
            StageName::RoutingDecision => self.routing_decision(claim_id).await,
            StageName::Submission => self.submission(claim_id).await,
        }
    }

    async fn intake(&self, claim_id: ClaimId) -> Result<StageOutcome, WorkflowError> {
        let mut claim = self.store.load_claim(claim_id).await?;
        claim.update_status(ClaimStatus::Processing)?;
        self.store.save_claim(&claim).await?;

        Ok(StageOutcome::Completed(Some(json!({
            "claim_number": claim.claim_number,
            "documents": claim.documents.len(),
        }))))
    }

    async fn document_processing(&self, claim_id: ClaimId) -> Result<StageOutcome, WorkflowError> {
        let mut claim = self.store.load_claim(claim_id).await?;
        if claim.documents.is_empty() {
            return Ok(StageOutcome::Skipped("No documents attached".to_string()));
        }

        for document in &mut claim.documents {
            let assessment = self.ocr.assess(document).await?;
            document.quality_score = Some(assessment.quality_score);
            if document.document_type.is_none() {
                document.document_type = assessment.document_type;
            }
        }
        let assessed = claim.documents.len();
        self.store.save_claim(&claim).await?;

        Ok(StageOutcome::Completed(Some(json!({
            "documents_assessed": assessed,
        }))))
    }

    /// Fail-fast: one dead-lettered OCR job fails the stage (and so the
    /// workflow) for this claim
    async fn ocr_extraction(&self, claim_id: ClaimId) -> Result<StageOutcome, WorkflowError> {
        let claim = self.store.load_claim(claim_id).await?;
        if claim.documents.is_empty() {
            return Ok(StageOutcome::Skipped("No documents to OCR".to_string()));
        }

        let mut handles = Vec::with_capacity(claim.documents.len());
        for document in &claim.documents {
            let message = QueueMessage::for_claim(
                "ocr_document",
                json!({ "document_id": document.id }),
                claim_id,
            );
            handles.push(self.queue.publish_job(&self.config.ocr_queue, message).await?);
        }

        for handle in handles {
            match handle.outcome().await? {
                JobOutcome::Completed => {}
                JobOutcome::DeadLettered { reason } => {
                    return Err(WorkflowError::StageFailed {
                        stage: StageName::OcrExtraction.to_string(),
                        reason: format!("OCR failed: {reason}"),
                    });
                }
            }
        }

        Ok(StageOutcome::Completed(Some(json!({
            "documents_processed": claim.documents.len(),
        }))))
    }

    /// Continue-on-error: a document whose extraction dead-letters is
    /// skipped; the stage still completes with whatever was extracted
    async fn ai_field_extraction(&self, claim_id: ClaimId) -> Result<StageOutcome, WorkflowError> {
        let claim = self.store.load_claim(claim_id).await?;
        if claim.documents.is_empty() {
            return Ok(StageOutcome::Skipped(
                "No documents to extract fields from".to_string(),
            ));
        }

        let mut handles = Vec::with_capacity(claim.documents.len());
        for document in &claim.documents {
            let message = QueueMessage::for_claim(
                "extract_fields",
                json!({ "document_id": document.id }),
                claim_id,
            );
            handles.push(
                self.queue
                    .publish_job(&self.config.extraction_queue, message)
                    .await?,
            );
        }

        let mut extracted = 0usize;
        let mut skipped = 0usize;
        for handle in handles {
            match handle.outcome().await? {
                JobOutcome::Completed => extracted += 1,
                JobOutcome::DeadLettered { reason } => {
                    warn!(%claim_id, reason, "field extraction skipped for document");
                    skipped += 1;
                }
            }
        }

        // Project what was extracted into the claim's typed fields
        let mut claim = self.store.load_claim(claim_id).await?;
        project_fields(&mut claim);
        self.store.save_claim(&claim).await?;

        Ok(StageOutcome::Completed(Some(json!({
            "documents_extracted": extracted,
            "documents_skipped": skipped,
        }))))
    }

    async fn eligibility_check(&self, claim_id: ClaimId) -> Result<StageOutcome, WorkflowError> {
        let mut claim = self.store.load_claim(claim_id).await?;
        let outcome = self.eligibility.check(&claim);

        let mut checks = outcome.checks;
        checks.extend(self.rule_checks(&claim, CheckCategory::Eligibility).await);
        replace_checks(&mut claim, CheckCategory::Eligibility, checks);
        self.store.save_claim(&claim).await?;

        Ok(StageOutcome::Completed(Some(json!({
            "overall": outcome.overall,
        }))))
    }

    async fn code_validation(&self, claim_id: ClaimId) -> Result<StageOutcome, WorkflowError> {
        let mut claim = self.store.load_claim(claim_id).await?;
        let outcome = self.codes.validate(&claim);

        let mut checks = outcome.checks;
        checks.extend(self.rule_checks(&claim, CheckCategory::Code).await);
        replace_checks(&mut claim, CheckCategory::Code, checks);
        self.store.save_claim(&claim).await?;

        Ok(StageOutcome::Completed(Some(json!({
            "overall": outcome.overall,
        }))))
    }

    async fn business_rules(&self, claim_id: ClaimId) -> Result<StageOutcome, WorkflowError> {
        let mut claim = self.store.load_claim(claim_id).await?;
        let checks = self.rule_checks(&claim, CheckCategory::BusinessRule).await;
        let evaluated = checks.len();
        replace_checks(&mut claim, CheckCategory::BusinessRule, checks);
        self.store.save_claim(&claim).await?;

        Ok(StageOutcome::Completed(Some(json!({
            "rules_evaluated": evaluated,
        }))))
    }

    async fn document_check(&self, claim_id: ClaimId) -> Result<StageOutcome, WorkflowError> {
        let mut claim = self.store.load_claim(claim_id).await?;
        let outcome = self.documents.check(&claim);

        let mut checks = outcome.to_checks();
        checks.extend(self.rule_checks(&claim, CheckCategory::Document).await);
        replace_checks(&mut claim, CheckCategory::Document, checks);
        self.store.save_claim(&claim).await?;

        Ok(StageOutcome::Completed(Some(json!({
            "status": outcome.status,
            "missing_documents": outcome.missing.len(),
        }))))
    }

    async fn routing_decision(&self, claim_id: ClaimId) -> Result<StageOutcome, WorkflowError> {
        let decision = self.route_claim(claim_id).await?;
        let result = serde_json::to_value(&decision)
            .map_err(|e| PortError::internal(e.to_string()))?;
        if decision.is_clean() {
            Ok(StageOutcome::Completed(Some(result)))
        } else {
            Ok(StageOutcome::Terminate(result))
        }
    }

    /// Routes the claim and persists the consequences: confidence score,
    /// claim status, and an audit entry. Shared by the routing stage and
    /// the manual re-validate action.
    pub async fn route_claim(&self, claim_id: ClaimId) -> Result<RoutingDecision, WorkflowError> {
        let mut claim = self.store.load_claim(claim_id).await?;
        let decision = self.decide(&claim)?;

        claim.confidence_score = Some(decision.confidence_score);
        match decision.queue {
            domain_routing::QueueAssignment::CleanSubmission => {}
            domain_routing::QueueAssignment::ExceptionQueue => {
                claim.update_status(ClaimStatus::Exception)?;
            }
            domain_routing::QueueAssignment::HumanReview => {
                claim.update_status(ClaimStatus::HumanReview)?;
            }
        }
        self.store.save_claim(&claim).await?;

        self.audit
            .record(AuditEvent::new(
                claim_id,
                AuditEventType::ClaimRouted,
                format!("Routed to {:?}: {}", decision.queue, decision.reason),
            ))
            .await?;

        info!(
            %claim_id,
            queue = ?decision.queue,
            confidence = decision.confidence_score,
            "routing decision made"
        );
        Ok(decision)
    }

    async fn submission(&self, claim_id: ClaimId) -> Result<StageOutcome, WorkflowError> {
        let mut claim = self.store.load_claim(claim_id).await?;
        let confirmation_number = format!("SUB-{}", Uuid::now_v7().simple());
        claim.update_status(ClaimStatus::Submitted)?;
        self.store.save_claim(&claim).await?;

        self.audit
            .record(AuditEvent::new(
                claim_id,
                AuditEventType::ClaimSubmitted,
                format!("Submitted with confirmation {confirmation_number}"),
            ))
            .await?;

        Ok(StageOutcome::Completed(Some(json!({
            "confirmation_number": confirmation_number,
        }))))
    }

    /// Recomputes the validator outcomes and routes the claim; pure apart
    /// from reading the claim snapshot, so it can be re-run for audit
    pub fn decide(&self, claim: &Claim) -> Result<RoutingDecision, WorkflowError> {
        let eligibility = self.eligibility.check(claim);
        let codes = self.codes.validate(claim);
        let documents = self.documents.check(claim);
        let rule_checks: Vec<ValidationCheck> = claim
            .checks
            .iter()
            .filter(|c| c.category == CheckCategory::BusinessRule)
            .cloned()
            .collect();
        let total_charges = claim.total_charges()?;

        Ok(self.router.route(&RoutingInputs {
            eligibility: &eligibility,
            codes: &codes,
            documents: &documents,
            rule_checks: &rule_checks,
            total_charges,
        }))
    }

    async fn rule_checks(&self, claim: &Claim, category: CheckCategory) -> Vec<ValidationCheck> {
        let context = RuleContext::from_claim(claim);
        let rules = self.rules.read().await;
        rules.execute_by_category(&context, category)
    }
}

/// Replaces the live check set for one category; at most one set per
/// category exists at a time
fn replace_checks(claim: &mut Claim, category: CheckCategory, checks: Vec<ValidationCheck>) {
    claim.checks.retain(|c| c.category != category);
    claim.checks.extend(checks);
}

#[derive(Deserialize)]
struct DocumentJob {
    document_id: DocumentId,
}

fn job_document(message: &QueueMessage) -> anyhow::Result<(ClaimId, DocumentId)> {
    let claim_id = message
        .claim_id
        .ok_or_else(|| anyhow::anyhow!("message {} has no claim id", message.id))?;
    let job: DocumentJob = serde_json::from_value(message.payload.clone())?;
    Ok((claim_id, job.document_id))
}

/// Consumes OCR jobs: extracts text and writes it back to the document
pub struct OcrJobHandler {
    pub store: Arc<dyn ClaimStore>,
    pub ocr: Arc<dyn OcrService>,
}

#[async_trait::async_trait]
impl MessageHandler for OcrJobHandler {
    async fn handle(&self, message: &QueueMessage) -> anyhow::Result<()> {
        let (claim_id, document_id) = job_document(message)?;
        let mut claim = self.store.load_claim(claim_id).await?;
        let snapshot = claim
            .documents
            .iter()
            .find(|d| d.id == document_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("document {document_id} not on claim {claim_id}"))?;

        let result = self.ocr.extract_text(&snapshot).await;
        if let Some(document) = claim.documents.iter_mut().find(|d| d.id == document_id) {
            match &result {
                Ok(text) => {
                    document.ocr_status = OcrStatus::Completed;
                    document.ocr_text = Some(text.text.clone());
                    document.ocr_confidence = Some(text.confidence);
                }
                Err(_) => document.ocr_status = OcrStatus::Failed,
            }
        }
        self.store.save_claim(&claim).await?;
        result.map(|_| ()).map_err(Into::into)
    }
}

/// Consumes AI field-extraction jobs; appends extracted fields to the claim
pub struct ExtractionJobHandler {
    pub store: Arc<dyn ClaimStore>,
    pub extractor: Arc<dyn FieldExtractor>,
}

#[async_trait::async_trait]
impl MessageHandler for ExtractionJobHandler {
    async fn handle(&self, message: &QueueMessage) -> anyhow::Result<()> {
        let (claim_id, document_id) = job_document(message)?;
        let mut claim = self.store.load_claim(claim_id).await?;
        let document = claim
            .documents
            .iter()
            .find(|d| d.id == document_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("document {document_id} not on claim {claim_id}"))?;

        if document.ocr_text.is_none() {
            // Nothing to extract from; not an error
            return Ok(());
        }

        let fields = self.extractor.extract_fields(&claim, &document).await?;
        claim.extracted_fields.extend(fields);
        self.store.save_claim(&claim).await?;
        Ok(())
    }
}

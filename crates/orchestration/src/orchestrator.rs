//! Workflow orchestrator
//!
//! Drives every claim through the fixed stage pipeline. Advancement is
//! event-driven: completing a stage enqueues the claim id on an internal
//! channel consumed by a bounded pool of workers, so deep pipelines never
//! recurse and many claims progress concurrently. Each claim's workflow
//! sits behind its own lock; a claim is only ever advanced by one worker
//! at a time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{error, info, warn};

use core_kernel::{ClaimId, PortError, RuleId};
use domain_claims::{ClaimStatus, ValidationCheck};
use domain_routing::RoutingDecision;
use domain_rules::{BusinessRule, RuleError, RulesEngine};
use domain_validation::{
    CodeValidator, DocumentChecker, DocumentOutcome, EligibilityChecker, ValidationOutcome,
};
use infra_queue::QueueClient;

use crate::audit::{AuditEvent, AuditEventType};
use crate::config::PipelineConfig;
use crate::error::WorkflowError;
use crate::ports::{AuditSink, ClaimStore, FieldExtractor, OcrService};
use crate::stages::{ExtractionJobHandler, OcrJobHandler, StageOutcome, StageRunner};
use crate::workflow::{StageName, Workflow, WorkflowStatus};

type Registry = Mutex<HashMap<ClaimId, Arc<AsyncMutex<Workflow>>>>;

pub struct WorkflowOrchestrator {
    store: Arc<dyn ClaimStore>,
    audit: Arc<dyn AuditSink>,
    rules: Arc<RwLock<RulesEngine>>,
    runner: Arc<StageRunner>,
    registry: Registry,
    advance_tx: UnboundedSender<ClaimId>,
}

impl WorkflowOrchestrator {
    /// Wires the pipeline together: declares the work queues, starts their
    /// consumers, and starts the advance workers
    pub async fn new(
        store: Arc<dyn ClaimStore>,
        ocr: Arc<dyn OcrService>,
        extractor: Arc<dyn FieldExtractor>,
        audit: Arc<dyn AuditSink>,
        queue: Arc<QueueClient>,
        rules: Arc<RwLock<RulesEngine>>,
        config: PipelineConfig,
    ) -> Result<Arc<Self>, WorkflowError> {
        queue.declare(&config.ocr_queue).await?;
        queue.declare(&config.extraction_queue).await?;

        queue.subscribe(
            &config.ocr_queue,
            Arc::new(OcrJobHandler {
                store: Arc::clone(&store),
                ocr: Arc::clone(&ocr),
            }),
        );
        queue.subscribe(
            &config.extraction_queue,
            Arc::new(ExtractionJobHandler {
                store: Arc::clone(&store),
                extractor,
            }),
        );

        let runner = Arc::new(StageRunner::new(
            Arc::clone(&store),
            ocr,
            Arc::clone(&queue),
            Arc::clone(&rules),
            Arc::clone(&audit),
            config.clone(),
        ));

        let (advance_tx, advance_rx) = mpsc::unbounded_channel();
        let orchestrator = Arc::new(Self {
            store,
            audit,
            rules,
            runner,
            registry: Mutex::new(HashMap::new()),
            advance_tx,
        });
        orchestrator.spawn_workers(advance_rx, config.worker_count.max(1));
        Ok(orchestrator)
    }

    fn spawn_workers(self: &Arc<Self>, rx: UnboundedReceiver<ClaimId>, count: usize) {
        let rx = Arc::new(AsyncMutex::new(rx));
        for worker in 0..count {
            let rx = Arc::clone(&rx);
            let weak = Arc::downgrade(self);
            tokio::spawn(async move {
                loop {
                    let claim_id = { rx.lock().await.recv().await };
                    let Some(claim_id) = claim_id else { break };
                    let Some(orchestrator) = weak.upgrade() else { break };
                    if let Err(e) = orchestrator.advance(claim_id).await {
                        error!(%claim_id, worker, error = %e, "workflow advance failed");
                    }
                }
            });
        }
    }

    /// Starts the workflow for a claim, or returns the one already tracked
    ///
    /// Idempotent per claim id: a repeat call returns the existing workflow
    /// unchanged, terminal or not, and never creates a second instance.
    pub async fn start_workflow(&self, claim_id: ClaimId) -> Result<Workflow, WorkflowError> {
        // The claim must exist before a workflow is created for it
        self.store.load_claim(claim_id).await?;

        if let Some(entry) = self.registry_entry(claim_id) {
            return Ok(entry.lock().await.clone());
        }

        // A workflow persisted by an earlier process is adopted, not replaced
        if let Some(persisted) = self.store.load_workflow(claim_id).await? {
            let running = persisted.status == WorkflowStatus::Running;
            let (entry, inserted) = self.track(claim_id, persisted);
            let snapshot = entry.lock().await.clone();
            if inserted && running {
                self.enqueue(claim_id);
            }
            return Ok(snapshot);
        }

        let (entry, inserted) = self.track(claim_id, Workflow::new(claim_id));
        let snapshot = entry.lock().await.clone();
        if !inserted {
            // Lost the race to a concurrent start; that workflow is the one
            return Ok(snapshot);
        }

        if let Err(e) = self.store.save_workflow(&snapshot).await {
            self.lock_registry().remove(&claim_id);
            return Err(e.into());
        }
        self.record_audit(claim_id, AuditEventType::WorkflowStarted, "Workflow started")
            .await;
        self.enqueue(claim_id);

        info!(%claim_id, "workflow started");
        Ok(snapshot)
    }

    /// Current workflow snapshot, from memory or the store
    pub async fn get_workflow(&self, claim_id: ClaimId) -> Result<Option<Workflow>, WorkflowError> {
        if let Some(entry) = self.registry_entry(claim_id) {
            return Ok(Some(entry.lock().await.clone()));
        }
        Ok(self.store.load_workflow(claim_id).await?)
    }

    /// Pauses a running workflow before its next stage executes
    ///
    /// In-flight async work is not interrupted and partial side effects
    /// are not rolled back.
    pub async fn pause_workflow(&self, claim_id: ClaimId) -> Result<(), WorkflowError> {
        let entry = self
            .registry_entry(claim_id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(claim_id.to_string()))?;
        let mut workflow = entry.lock().await;
        workflow.pause();
        self.store.save_workflow(&workflow).await?;
        drop(workflow);

        self.record_audit(claim_id, AuditEventType::WorkflowPaused, "Workflow paused")
            .await;
        Ok(())
    }

    /// Resumes a paused workflow from the stage after the last completed one
    pub async fn resume_workflow(&self, claim_id: ClaimId) -> Result<(), WorkflowError> {
        let entry = self
            .registry_entry(claim_id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(claim_id.to_string()))?;
        let mut workflow = entry.lock().await;
        if workflow.status != WorkflowStatus::Paused {
            return Ok(());
        }
        workflow.resume();
        self.store.save_workflow(&workflow).await?;
        drop(workflow);

        self.record_audit(claim_id, AuditEventType::WorkflowResumed, "Workflow resumed")
            .await;
        self.enqueue(claim_id);
        Ok(())
    }

    /// Rebuilds in-flight workflows from the store after a restart and
    /// re-enqueues the running ones; returns how many were recovered
    pub async fn resume_open_workflows(&self) -> Result<usize, WorkflowError> {
        let open = self.store.open_workflows().await?;
        let mut recovered = 0;
        for workflow in open {
            let claim_id = workflow.claim_id;
            let running = workflow.status == WorkflowStatus::Running;
            {
                let mut registry = self.lock_registry();
                if registry.contains_key(&claim_id) {
                    continue;
                }
                registry.insert(claim_id, Arc::new(AsyncMutex::new(workflow)));
            }
            if running {
                self.enqueue(claim_id);
            }
            recovered += 1;
            self.record_audit(
                claim_id,
                AuditEventType::WorkflowResumed,
                "Workflow recovered after restart",
            )
            .await;
        }
        Ok(recovered)
    }

    /// Executes the current stage of one workflow, then re-enqueues it
    pub async fn advance(&self, claim_id: ClaimId) -> Result<(), WorkflowError> {
        let entry = self
            .registry_entry(claim_id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(claim_id.to_string()))?;
        let mut workflow = entry.lock().await;
        if workflow.is_terminal() || workflow.status == WorkflowStatus::Paused {
            return Ok(());
        }

        let stage = workflow.current_stage;
        workflow.mark_in_progress(stage);
        self.store.save_workflow(&workflow).await?;

        match self.runner.run(claim_id, stage).await {
            Ok(StageOutcome::Completed(result)) => {
                workflow.mark_completed(stage, result);
                self.record_audit(
                    claim_id,
                    AuditEventType::StageCompleted,
                    format!("Stage {stage} completed"),
                )
                .await;
                self.finish_transition(claim_id, &workflow).await?;
            }
            Ok(StageOutcome::Skipped(reason)) => {
                workflow.mark_skipped(stage, reason.clone());
                self.record_audit(
                    claim_id,
                    AuditEventType::StageSkipped,
                    format!("Stage {stage} skipped: {reason}"),
                )
                .await;
                self.finish_transition(claim_id, &workflow).await?;
            }
            Ok(StageOutcome::Terminate(result)) => {
                workflow.mark_completed(stage, Some(result));
                self.record_audit(
                    claim_id,
                    AuditEventType::StageCompleted,
                    format!("Stage {stage} completed"),
                )
                .await;
                workflow.mark_skipped(
                    StageName::Submission,
                    "Claim requires manual handling before submission",
                );
                self.record_audit(
                    claim_id,
                    AuditEventType::StageSkipped,
                    "Stage submission skipped: claim is not clean",
                )
                .await;
                self.finish_transition(claim_id, &workflow).await?;
            }
            Err(e) => {
                let reason = e.to_string();
                workflow.mark_failed(stage, &reason);
                self.store.save_workflow(&workflow).await?;
                self.record_audit(
                    claim_id,
                    AuditEventType::StageFailed,
                    format!("Stage {stage} failed: {reason}"),
                )
                .await;
                self.record_audit(
                    claim_id,
                    AuditEventType::WorkflowFailed,
                    format!("Workflow failed at {stage}"),
                )
                .await;
                self.fail_claim(claim_id).await;
            }
        }
        Ok(())
    }

    async fn finish_transition(
        &self,
        claim_id: ClaimId,
        workflow: &Workflow,
    ) -> Result<(), WorkflowError> {
        self.store.save_workflow(workflow).await?;
        match workflow.status {
            WorkflowStatus::Completed => {
                self.record_audit(
                    claim_id,
                    AuditEventType::WorkflowCompleted,
                    "Workflow completed",
                )
                .await;
                info!(%claim_id, "workflow completed");
            }
            WorkflowStatus::Running => self.enqueue(claim_id),
            _ => {}
        }
        Ok(())
    }

    async fn fail_claim(&self, claim_id: ClaimId) {
        match self.store.load_claim(claim_id).await {
            Ok(mut claim) => {
                if let Err(e) = claim.update_status(ClaimStatus::Failed) {
                    warn!(%claim_id, error = %e, "could not mark claim failed");
                    return;
                }
                if let Err(e) = self.store.save_claim(&claim).await {
                    warn!(%claim_id, error = %e, "could not persist failed claim");
                }
            }
            Err(e) => warn!(%claim_id, error = %e, "could not load claim to mark failed"),
        }
    }

    // --- rule management -------------------------------------------------

    pub async fn add_rule(&self, rule: BusinessRule) {
        self.rules.write().await.add_rule(rule);
    }

    pub async fn remove_rule(&self, id: RuleId) -> Option<BusinessRule> {
        self.rules.write().await.remove_rule(id)
    }

    pub async fn update_rule(&self, rule: BusinessRule) -> Result<(), RuleError> {
        self.rules.write().await.update_rule(rule)
    }

    pub async fn get_rules(&self) -> Vec<BusinessRule> {
        self.rules.read().await.get_rules().to_vec()
    }

    // --- standalone validation entry points ------------------------------

    /// Runs the eligibility checker against the stored claim
    pub async fn check_eligibility(
        &self,
        claim_id: ClaimId,
    ) -> Result<ValidationOutcome, WorkflowError> {
        let claim = self.store.load_claim(claim_id).await?;
        Ok(EligibilityChecker::new().check(&claim))
    }

    /// Runs the code validator against the stored claim
    pub async fn validate_codes(
        &self,
        claim_id: ClaimId,
    ) -> Result<ValidationOutcome, WorkflowError> {
        let claim = self.store.load_claim(claim_id).await?;
        Ok(CodeValidator::new().validate(&claim))
    }

    /// Runs the document checker against the stored claim
    pub async fn check_documents(
        &self,
        claim_id: ClaimId,
    ) -> Result<DocumentOutcome, WorkflowError> {
        let claim = self.store.load_claim(claim_id).await?;
        Ok(DocumentChecker::new().check(&claim))
    }

    /// Re-runs the four check stages and the router for a claim that was
    /// corrected after landing in an exception or review queue
    pub async fn revalidate(&self, claim_id: ClaimId) -> Result<RoutingDecision, WorkflowError> {
        let mut claim = self.store.load_claim(claim_id).await?;
        claim.update_status(ClaimStatus::Processing)?;
        self.store.save_claim(&claim).await?;

        for stage in [
            StageName::EligibilityCheck,
            StageName::CodeValidation,
            StageName::BusinessRules,
            StageName::DocumentCheck,
        ] {
            self.runner.run(claim_id, stage).await?;
        }
        self.runner.route_claim(claim_id).await
    }

    /// Live checks currently stored for a claim
    pub async fn claim_checks(&self, claim_id: ClaimId) -> Result<Vec<ValidationCheck>, WorkflowError> {
        Ok(self.store.load_claim(claim_id).await?.checks)
    }

    /// Test/ops helper: waits for the claim's workflow to reach a terminal
    /// status, polling the in-memory registry
    pub async fn wait_until_terminal(
        &self,
        claim_id: ClaimId,
        timeout: Duration,
    ) -> Result<Workflow, WorkflowError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(workflow) = self.get_workflow(claim_id).await? {
                if workflow.is_terminal() {
                    return Ok(workflow);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(WorkflowError::Port(PortError::Timeout {
                    operation: format!("wait_until_terminal({claim_id})"),
                    duration_ms: timeout.as_millis() as u64,
                }));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    // --- internals --------------------------------------------------------

    fn registry_entry(&self, claim_id: ClaimId) -> Option<Arc<AsyncMutex<Workflow>>> {
        self.lock_registry().get(&claim_id).map(Arc::clone)
    }

    /// Tracks the workflow unless the claim already has one; returns the
    /// tracked entry and whether this call inserted it. The check and the
    /// insert happen under a single registry lock so concurrent starts
    /// converge on one instance.
    fn track(&self, claim_id: ClaimId, workflow: Workflow) -> (Arc<AsyncMutex<Workflow>>, bool) {
        use std::collections::hash_map::Entry;
        match self.lock_registry().entry(claim_id) {
            Entry::Occupied(e) => (Arc::clone(e.get()), false),
            Entry::Vacant(e) => {
                let entry = Arc::new(AsyncMutex::new(workflow));
                e.insert(Arc::clone(&entry));
                (entry, true)
            }
        }
    }

    fn lock_registry(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<ClaimId, Arc<AsyncMutex<Workflow>>>> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enqueue(&self, claim_id: ClaimId) {
        if self.advance_tx.send(claim_id).is_err() {
            warn!(%claim_id, "advance workers are gone; workflow stalled");
        }
    }

    /// Audit failures are logged, never fatal to the pipeline
    async fn record_audit(
        &self,
        claim_id: ClaimId,
        event_type: AuditEventType,
        detail: impl Into<String>,
    ) {
        let event = AuditEvent::new(claim_id, event_type, detail);
        if let Err(e) = self.audit.record(event).await {
            warn!(%claim_id, error = %e, "audit record failed");
        }
    }
}

//! Workflow state machine types
//!
//! A workflow is the per-claim record of the fixed stage pipeline. It is
//! persisted on every transition so in-flight workflows can be rebuilt
//! after a restart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::{ClaimId, WorkflowId};

/// Pipeline stages in their fixed execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Intake,
    DocumentProcessing,
    OcrExtraction,
    AiFieldExtraction,
    EligibilityCheck,
    CodeValidation,
    BusinessRules,
    DocumentCheck,
    RoutingDecision,
    Submission,
}

impl StageName {
    /// Every stage, in execution order
    pub const ALL: [StageName; 10] = [
        StageName::Intake,
        StageName::DocumentProcessing,
        StageName::OcrExtraction,
        StageName::AiFieldExtraction,
        StageName::EligibilityCheck,
        StageName::CodeValidation,
        StageName::BusinessRules,
        StageName::DocumentCheck,
        StageName::RoutingDecision,
        StageName::Submission,
    ];

    /// The stage after this one, or None for the last
    pub fn next(self) -> Option<StageName> {
        let index = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(index + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageName::Intake => "intake",
            StageName::DocumentProcessing => "document_processing",
            StageName::OcrExtraction => "ocr_extraction",
            StageName::AiFieldExtraction => "ai_field_extraction",
            StageName::EligibilityCheck => "eligibility_check",
            StageName::CodeValidation => "code_validation",
            StageName::BusinessRules => "business_rules",
            StageName::DocumentCheck => "document_check",
            StageName::RoutingDecision => "routing_decision",
            StageName::Submission => "submission",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Paused,
}

/// One stage's execution record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStage {
    pub name: StageName,
    pub status: StageStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub result: Option<Value>,
}

impl WorkflowStage {
    fn pending(name: StageName) -> Self {
        Self {
            name,
            status: StageStatus::Pending,
            started_at: None,
            completed_at: None,
            error: None,
            result: None,
        }
    }
}

/// Per-claim pipeline state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub claim_id: ClaimId,
    /// The stage the pipeline will execute next (or is executing)
    pub current_stage: StageName,
    pub stages: Vec<WorkflowStage>,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(claim_id: ClaimId) -> Self {
        let now = Utc::now();
        Self {
            id: WorkflowId::new_v7(),
            claim_id,
            current_stage: StageName::Intake,
            stages: StageName::ALL.iter().map(|s| WorkflowStage::pending(*s)).collect(),
            status: WorkflowStatus::Running,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }

    pub fn stage(&self, name: StageName) -> &WorkflowStage {
        // Construction guarantees every stage exists exactly once
        self.stages
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| unreachable!("stage {name} missing"))
    }

    fn stage_mut(&mut self, name: StageName) -> &mut WorkflowStage {
        self.stages
            .iter_mut()
            .find(|s| s.name == name)
            .unwrap_or_else(|| unreachable!("stage {name} missing"))
    }

    pub fn mark_in_progress(&mut self, name: StageName) {
        let stage = self.stage_mut(name);
        stage.status = StageStatus::InProgress;
        stage.started_at = Some(Utc::now());
        self.touch();
    }

    /// Completes a stage and moves `current_stage` forward; the workflow
    /// itself completes after the last stage
    pub fn mark_completed(&mut self, name: StageName, result: Option<Value>) {
        let stage = self.stage_mut(name);
        stage.status = StageStatus::Completed;
        stage.completed_at = Some(Utc::now());
        stage.result = result;
        self.advance_from(name);
    }

    /// Marks a stage skipped with an explanatory result
    pub fn mark_skipped(&mut self, name: StageName, reason: impl Into<String>) {
        let stage = self.stage_mut(name);
        stage.status = StageStatus::Skipped;
        stage.completed_at = Some(Utc::now());
        stage.result = Some(Value::String(reason.into()));
        self.advance_from(name);
    }

    /// Fails the stage and the whole workflow
    pub fn mark_failed(&mut self, name: StageName, error: impl Into<String>) {
        let error = error.into();
        let stage = self.stage_mut(name);
        stage.status = StageStatus::Failed;
        stage.completed_at = Some(Utc::now());
        stage.error = Some(error);
        self.status = WorkflowStatus::Failed;
        self.touch();
    }

    /// Terminates the workflow as completed without running the remaining
    /// stages (the routing branch for non-clean claims)
    pub fn terminate_completed(&mut self) {
        self.status = WorkflowStatus::Completed;
        self.touch();
    }

    pub fn pause(&mut self) {
        if self.status == WorkflowStatus::Running {
            self.status = WorkflowStatus::Paused;
            self.touch();
        }
    }

    /// Returns the workflow to running; the caller re-enqueues it
    pub fn resume(&mut self) {
        if self.status == WorkflowStatus::Paused {
            self.status = WorkflowStatus::Running;
            self.touch();
        }
    }

    fn advance_from(&mut self, name: StageName) {
        match name.next() {
            Some(next) => self.current_stage = next,
            None => self.status = WorkflowStatus::Completed,
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

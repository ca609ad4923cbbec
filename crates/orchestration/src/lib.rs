//! Claims Pipeline Orchestration
//!
//! The top-level state machine that drives a claim through the fixed
//! validation-and-routing pipeline:
//!
//! ```text
//! intake -> document_processing -> ocr_extraction -> ai_field_extraction
//!        -> eligibility_check -> code_validation -> business_rules
//!        -> document_check -> routing_decision -> submission
//! ```
//!
//! The orchestrator owns no business logic: stages call into the domain
//! crates, long-running work goes through the queue subsystem, and every
//! transition is persisted and audited.

pub mod audit;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod stages;
pub mod workflow;

pub use audit::{AuditEvent, AuditEventType};
pub use config::PipelineConfig;
pub use error::WorkflowError;
pub use orchestrator::WorkflowOrchestrator;
pub use ports::{AuditSink, ClaimStore, DocumentAssessment, FieldExtractor, OcrService, OcrText};
pub use stages::{ExtractionJobHandler, OcrJobHandler, StageOutcome, StageRunner};
pub use workflow::{StageName, StageStatus, Workflow, WorkflowStage, WorkflowStatus};

//! End-to-end pipeline tests on in-memory adapters

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use serde_json::json;

use domain_claims::{CheckCategory, CheckStatus, ClaimStatus, OcrStatus};
use domain_routing::QueueAssignment;
use domain_rules::{
    ActionType, BusinessRule, ConditionLogic, ConditionOperator, RuleAction, RuleCondition,
};
use domain_validation::DocumentCompleteness;
use orchestration::{AuditEventType, StageName, StageStatus, Workflow, WorkflowStatus};
use test_utils::{
    clean_claim, init_test_logging, knee_replacement_claim, standard_extracted_fields,
    ClaimBuilder, MockFieldExtractor, MockOcrService, TestPipeline, INVALID_NPI,
};

const TERMINAL_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_clean_claim_submits_end_to_end() {
    init_test_logging();
    let pipeline = TestPipeline::new().await.unwrap();
    let claim_id = pipeline.store.seed(clean_claim());

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(workflow.status, WorkflowStatus::Completed);
    assert_eq!(
        workflow.stage(StageName::Submission).status,
        StageStatus::Completed
    );
    // No documents attached: the document stages are skipped, not failed
    assert_eq!(
        workflow.stage(StageName::DocumentProcessing).status,
        StageStatus::Skipped
    );
    assert_eq!(
        workflow.stage(StageName::OcrExtraction).status,
        StageStatus::Skipped
    );

    let claim = pipeline.store.claim(claim_id).unwrap();
    assert_eq!(claim.status, ClaimStatus::Submitted);
    assert_eq!(claim.confidence_score, Some(100));
    assert!(pipeline
        .audit
        .has_event(claim_id, AuditEventType::ClaimSubmitted));
    assert!(pipeline
        .audit
        .has_event(claim_id, AuditEventType::WorkflowCompleted));
}

#[tokio::test]
async fn test_documents_flow_through_ocr_and_extraction() {
    init_test_logging();
    let pipeline = TestPipeline::new().await.unwrap();
    // Demographics arrive only through extraction
    let claim = ClaimBuilder::bare("CLM-DOC-1")
        .with_diagnoses(&["M54.5"])
        .with_procedure("99213", dec!(150))
        .with_document("uploads/claim-doc-1.pdf", None)
        .build();
    let claim_id = pipeline.store.seed(claim);

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(workflow.status, WorkflowStatus::Completed);

    let claim = pipeline.store.claim(claim_id).unwrap();
    assert_eq!(claim.documents[0].ocr_status, OcrStatus::Completed);
    assert_eq!(claim.documents[0].quality_score, Some(88));
    assert_eq!(
        claim.documents[0].document_type.as_deref(),
        Some("cms_1500")
    );
    // Projection from extracted fields filled the typed inputs
    assert_eq!(claim.member_id.as_deref(), Some("MBR-1001"));
    assert_eq!(claim.provider_npi.as_deref(), Some("1234567893"));
    assert_eq!(claim.status, ClaimStatus::Submitted);
}

#[tokio::test]
async fn test_missing_member_id_routes_to_human_review() {
    init_test_logging();
    let pipeline = TestPipeline::new().await.unwrap();
    let claim = ClaimBuilder::new().with_member_id(None).build();
    let claim_id = pipeline.store.seed(claim);

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();

    // The workflow completes, but submission never ran
    assert_eq!(workflow.status, WorkflowStatus::Completed);
    assert_eq!(
        workflow.stage(StageName::Submission).status,
        StageStatus::Skipped
    );

    let claim = pipeline.store.claim(claim_id).unwrap();
    assert_eq!(claim.status, ClaimStatus::HumanReview);

    let coverage = claim
        .checks
        .iter()
        .find(|c| c.name == "coverage_active")
        .unwrap();
    assert_eq!(coverage.status, CheckStatus::Fail);
    assert!(coverage
        .details
        .as_deref()
        .unwrap()
        .contains("Member ID is missing"));
}

#[tokio::test]
async fn test_knee_replacement_without_documents_is_incomplete() {
    init_test_logging();
    let pipeline = TestPipeline::new().await.unwrap();
    let claim_id = pipeline.store.seed(knee_replacement_claim());

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(workflow.status, WorkflowStatus::Completed);

    let documents = pipeline
        .orchestrator
        .check_documents(claim_id)
        .await
        .unwrap();
    assert_eq!(documents.status, DocumentCompleteness::Incomplete);
    let missing: Vec<&str> = documents
        .missing
        .iter()
        .map(|m| m.document_type.as_str())
        .collect();
    assert!(missing.contains(&"prior_authorization"));
    assert!(missing.contains(&"operative_notes"));
    assert!(missing.contains(&"history_and_physical"));
    assert!(missing.contains(&"medical_necessity"));

    let claim = pipeline.store.claim(claim_id).unwrap();
    assert_eq!(claim.status, ClaimStatus::HumanReview);

    let routing_result = workflow
        .stage(StageName::RoutingDecision)
        .result
        .clone()
        .unwrap();
    assert_eq!(routing_result["queue"], json!("HUMAN_REVIEW"));
    assert!(routing_result["reason"]
        .as_str()
        .unwrap()
        .contains("Missing required documentation"));
}

#[tokio::test]
async fn test_ocr_failure_fails_the_workflow() {
    init_test_logging();
    let pipeline = TestPipeline::with_services(
        Arc::new(MockOcrService::failing()),
        Arc::new(MockFieldExtractor::default()),
    )
    .await
    .unwrap();
    let claim = ClaimBuilder::new()
        .with_document("uploads/blurry-scan.pdf", None)
        .build();
    let claim_id = pipeline.store.seed(claim);

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(workflow.status, WorkflowStatus::Failed);
    let stage = workflow.stage(StageName::OcrExtraction);
    assert_eq!(stage.status, StageStatus::Failed);
    assert!(stage.error.as_deref().unwrap().contains("OCR failed"));

    let claim = pipeline.store.claim(claim_id).unwrap();
    assert_eq!(claim.status, ClaimStatus::Failed);
    assert_eq!(claim.documents[0].ocr_status, OcrStatus::Failed);

    // The poison message was dead-lettered, not dropped
    let metrics = pipeline.queue.broker().metrics().await;
    assert_eq!(metrics.get("claims.ocr.dlq").unwrap().published, 1);
    assert!(pipeline
        .audit
        .has_event(claim_id, AuditEventType::WorkflowFailed));
}

#[tokio::test]
async fn test_extraction_failure_is_skipped_per_document() {
    init_test_logging();
    let pipeline = TestPipeline::with_services(
        Arc::new(MockOcrService::new()),
        Arc::new(MockFieldExtractor::failing()),
    )
    .await
    .unwrap();
    // Demographics set at intake, so the claim survives without extraction
    let claim = ClaimBuilder::new()
        .with_document("uploads/claim.pdf", None)
        .build();
    let claim_id = pipeline.store.seed(claim);

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();

    // Extraction dead-lettered but the stage, and the workflow, completed
    assert_eq!(workflow.status, WorkflowStatus::Completed);
    let stage = workflow.stage(StageName::AiFieldExtraction);
    assert_eq!(stage.status, StageStatus::Completed);
    assert_eq!(stage.result.clone().unwrap()["documents_skipped"], json!(1));

    let claim = pipeline.store.claim(claim_id).unwrap();
    assert_eq!(claim.status, ClaimStatus::Submitted);
}

#[tokio::test]
async fn test_npi_warning_routes_to_exception_queue() {
    init_test_logging();
    let pipeline = TestPipeline::new().await.unwrap();
    let claim = ClaimBuilder::new().with_npi(None).build();
    let claim_id = pipeline.store.seed(claim);

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(workflow.status, WorkflowStatus::Completed);
    assert_eq!(
        workflow.stage(StageName::Submission).status,
        StageStatus::Skipped
    );

    let claim = pipeline.store.claim(claim_id).unwrap();
    assert_eq!(claim.status, ClaimStatus::Exception);
    // 100 - 5 for the network warning
    assert_eq!(claim.confidence_score, Some(95));

    let routing_result = workflow
        .stage(StageName::RoutingDecision)
        .result
        .clone()
        .unwrap();
    assert_eq!(routing_result["queue"], json!("EXCEPTION_QUEUE"));
    assert_eq!(
        routing_result["estimated_resolution_time"],
        json!("1-2 hours")
    );
}

#[tokio::test]
async fn test_business_rule_failure_forces_review() {
    init_test_logging();
    let pipeline = TestPipeline::new().await.unwrap();
    pipeline
        .orchestrator
        .add_rule(BusinessRule::new(
            "charges_over_plan_threshold",
            CheckCategory::BusinessRule,
            vec![RuleCondition::new(
                "Total Charges",
                ConditionOperator::GreaterThan,
                json!(5000),
            )],
            ConditionLogic::And,
            vec![
                RuleAction::new(ActionType::Fail, "Charges exceed the plan threshold"),
                RuleAction::new(ActionType::Pass, "Charges within plan threshold"),
            ],
        ))
        .await;

    let claim = ClaimBuilder::new().with_procedure("99214", dec!(6000)).build();
    let claim_id = pipeline.store.seed(claim);

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();

    let claim = pipeline.store.claim(claim_id).unwrap();
    assert_eq!(claim.status, ClaimStatus::HumanReview);
    let rule_check = claim
        .checks
        .iter()
        .find(|c| c.name == "charges_over_plan_threshold")
        .unwrap();
    assert_eq!(rule_check.category, CheckCategory::BusinessRule);
    assert_eq!(rule_check.status, CheckStatus::Fail);
}

#[tokio::test]
async fn test_pause_stops_before_next_stage_and_resume_continues() {
    init_test_logging();
    let pipeline = TestPipeline::with_services(
        Arc::new(MockOcrService::new().with_delay(Duration::from_millis(300))),
        Arc::new(MockFieldExtractor::default()),
    )
    .await
    .unwrap();
    let claim = ClaimBuilder::new()
        .with_document("uploads/claim.pdf", None)
        .build();
    let claim_id = pipeline.store.seed(claim);

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    // Land the pause while the slow OCR stage is in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    pipeline.orchestrator.pause_workflow(claim_id).await.unwrap();

    // The in-flight stage finishes, then the workflow parks
    tokio::time::sleep(Duration::from_millis(600)).await;
    let workflow = pipeline
        .orchestrator
        .get_workflow(claim_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(workflow.status, WorkflowStatus::Paused);
    assert!(!workflow.is_terminal());

    pipeline.orchestrator.resume_workflow(claim_id).await.unwrap();
    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(workflow.status, WorkflowStatus::Completed);
}

#[tokio::test]
async fn test_open_workflows_resume_after_restart() {
    init_test_logging();
    let pipeline = TestPipeline::new().await.unwrap();
    let claim_id = pipeline.store.seed(clean_claim());
    // A workflow persisted as running by a previous process
    pipeline.store.seed_workflow(Workflow::new(claim_id));

    let recovered = pipeline
        .orchestrator
        .resume_open_workflows()
        .await
        .unwrap();
    assert_eq!(recovered, 1);

    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(workflow.status, WorkflowStatus::Completed);
    assert_eq!(
        pipeline.store.claim(claim_id).unwrap().status,
        ClaimStatus::Submitted
    );
}

#[tokio::test]
async fn test_revalidate_after_correction_returns_clean() {
    init_test_logging();
    let pipeline = TestPipeline::new().await.unwrap();
    let claim = ClaimBuilder::new().with_member_id(None).build();
    let claim_id = pipeline.store.seed(claim);

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(
        pipeline.store.claim(claim_id).unwrap().status,
        ClaimStatus::HumanReview
    );

    // A biller supplies the missing member id
    let mut corrected = pipeline.store.claim(claim_id).unwrap();
    corrected.member_id = Some("MBR-9001".to_string());
    pipeline.store.seed(corrected);

    let decision = pipeline.orchestrator.revalidate(claim_id).await.unwrap();
    assert_eq!(decision.queue, QueueAssignment::CleanSubmission);
    assert_eq!(decision.confidence_score, 100);
    assert!(decision.issues_to_resolve.is_empty());
}

#[tokio::test]
async fn test_start_after_completion_returns_finished_workflow() {
    init_test_logging();
    let pipeline = TestPipeline::new().await.unwrap();
    let claim_id = pipeline.store.seed(clean_claim());

    let first = pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();

    // A repeat start hands back the finished run; it never replays the claim
    let again = pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(again.status, WorkflowStatus::Completed);

    let stored = pipeline.store.workflow(claim_id).unwrap();
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.status, WorkflowStatus::Completed);
    assert_eq!(
        pipeline.store.claim(claim_id).unwrap().status,
        ClaimStatus::Submitted
    );
}

#[tokio::test]
async fn test_concurrent_starts_share_one_workflow() {
    init_test_logging();
    let pipeline = TestPipeline::new().await.unwrap();
    let claim_id = pipeline.store.seed(clean_claim());

    let (a, b) = tokio::join!(
        pipeline.orchestrator.start_workflow(claim_id),
        pipeline.orchestrator.start_workflow(claim_id),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.id, b.id);

    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(workflow.id, a.id);
    assert_eq!(workflow.status, WorkflowStatus::Completed);
}

#[tokio::test]
async fn test_npi_check_digit_rule_catches_invalid_extracted_npi() {
    init_test_logging();
    // Ten digits with a bad check digit: the format check passes it, the
    // check-digit rule must not
    let fields = standard_extracted_fields()
        .into_iter()
        .map(|mut field| {
            if field.label == "Provider NPI" {
                field.value = INVALID_NPI.to_string();
            }
            field
        })
        .collect();
    let pipeline = TestPipeline::with_services(
        Arc::new(MockOcrService::new()),
        Arc::new(MockFieldExtractor::returning(fields)),
    )
    .await
    .unwrap();
    pipeline
        .orchestrator
        .add_rule(BusinessRule::new(
            "provider_npi_check_digit",
            CheckCategory::BusinessRule,
            vec![RuleCondition::unary(
                "Provider NPI",
                ConditionOperator::IsValidNpi,
            )],
            ConditionLogic::And,
            vec![
                RuleAction::new(ActionType::Pass, "Provider NPI check digit is valid"),
                RuleAction::new(ActionType::Fail, "Provider NPI fails its check digit"),
            ],
        ))
        .await;

    let claim = ClaimBuilder::new()
        .with_npi(None)
        .with_document("uploads/claim.pdf", None)
        .build();
    let claim_id = pipeline.store.seed(claim);

    pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();

    let claim = pipeline.store.claim(claim_id).unwrap();
    assert_eq!(claim.provider_npi.as_deref(), Some(INVALID_NPI));
    let npi_check = claim
        .checks
        .iter()
        .find(|c| c.name == "provider_npi_check_digit")
        .unwrap();
    assert_eq!(npi_check.status, CheckStatus::Fail);
    assert_eq!(claim.status, ClaimStatus::HumanReview);
}

#[tokio::test]
async fn test_start_workflow_is_idempotent_per_claim() {
    init_test_logging();
    let pipeline = TestPipeline::with_services(
        Arc::new(MockOcrService::new().with_delay(Duration::from_millis(200))),
        Arc::new(MockFieldExtractor::default()),
    )
    .await
    .unwrap();
    let claim = ClaimBuilder::new()
        .with_document("uploads/claim.pdf", None)
        .build();
    let claim_id = pipeline.store.seed(claim);

    let first = pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    let second = pipeline.orchestrator.start_workflow(claim_id).await.unwrap();
    assert_eq!(first.id, second.id);

    let workflow = pipeline
        .orchestrator
        .wait_until_terminal(claim_id, TERMINAL_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(workflow.id, first.id);
    assert_eq!(workflow.status, WorkflowStatus::Completed);
}

//! Stage runner tests against in-memory adapters

use std::sync::Arc;

use tokio::sync::RwLock;

use core_kernel::ClaimId;
use domain_claims::{CheckCategory, ClaimStatus};
use domain_rules::RulesEngine;
use infra_queue::{InMemoryBroker, QueueClient, QueueConfig};
use orchestration::{PipelineConfig, StageName, StageOutcome, StageRunner};
use test_utils::{
    clean_claim, init_test_logging, ClaimBuilder, InMemoryAuditSink, InMemoryClaimStore,
    MockOcrService,
};

fn runner_with_store() -> (StageRunner, Arc<InMemoryClaimStore>) {
    let store = Arc::new(InMemoryClaimStore::new());
    let queue = Arc::new(QueueClient::new(
        Arc::new(InMemoryBroker::new()),
        QueueConfig::default(),
    ));
    let runner = StageRunner::new(
        Arc::clone(&store) as _,
        Arc::new(MockOcrService::new()),
        queue,
        Arc::new(RwLock::new(RulesEngine::new())),
        InMemoryAuditSink::new(),
        PipelineConfig::default(),
    );
    (runner, store)
}

#[tokio::test]
async fn test_intake_on_unknown_claim_errors() {
    init_test_logging();
    let (runner, _store) = runner_with_store();

    let result = runner.run(ClaimId::new_v7(), StageName::Intake).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_intake_moves_claim_to_processing() {
    init_test_logging();
    let (runner, store) = runner_with_store();
    let claim_id = store.seed(clean_claim());

    let outcome = runner.run(claim_id, StageName::Intake).await.unwrap();
    assert!(matches!(outcome, StageOutcome::Completed(Some(_))));
    assert_eq!(
        store.claim(claim_id).unwrap().status,
        ClaimStatus::Processing
    );
}

#[tokio::test]
async fn test_document_processing_without_documents_is_skipped() {
    init_test_logging();
    let (runner, store) = runner_with_store();
    let claim_id = store.seed(clean_claim());

    let outcome = runner
        .run(claim_id, StageName::DocumentProcessing)
        .await
        .unwrap();
    match outcome {
        StageOutcome::Skipped(reason) => assert_eq!(reason, "No documents attached"),
        _ => panic!("expected skip for a claim without documents"),
    }
}

#[tokio::test]
async fn test_rerunning_a_check_stage_replaces_its_checks() {
    init_test_logging();
    let (runner, store) = runner_with_store();
    let claim_id = store.seed(clean_claim());

    runner
        .run(claim_id, StageName::EligibilityCheck)
        .await
        .unwrap();
    let first = eligibility_check_count(&store, claim_id);

    runner
        .run(claim_id, StageName::EligibilityCheck)
        .await
        .unwrap();
    let second = eligibility_check_count(&store, claim_id);

    assert!(first > 0);
    assert_eq!(first, second);
}

fn eligibility_check_count(store: &InMemoryClaimStore, claim_id: ClaimId) -> usize {
    store
        .claim(claim_id)
        .unwrap()
        .checks
        .iter()
        .filter(|c| c.category == CheckCategory::Eligibility)
        .count()
}

#[tokio::test]
async fn test_routing_terminates_workflow_for_failed_claim() {
    init_test_logging();
    let (runner, store) = runner_with_store();
    let mut claim = ClaimBuilder::new().with_member_id(None).build();
    claim.update_status(ClaimStatus::Processing).unwrap();
    let claim_id = store.seed(claim);

    for stage in [
        StageName::EligibilityCheck,
        StageName::CodeValidation,
        StageName::BusinessRules,
        StageName::DocumentCheck,
    ] {
        runner.run(claim_id, stage).await.unwrap();
    }

    let outcome = runner
        .run(claim_id, StageName::RoutingDecision)
        .await
        .unwrap();
    assert!(matches!(outcome, StageOutcome::Terminate(_)));

    let claim = store.claim(claim_id).unwrap();
    assert_eq!(claim.status, ClaimStatus::HumanReview);
    // Score carries the eligibility failure penalty
    assert!(claim.confidence_score.unwrap() < 95);
}

#[tokio::test]
async fn test_routing_passes_clean_claim_through() {
    init_test_logging();
    let (runner, store) = runner_with_store();
    let mut claim = clean_claim();
    claim.update_status(ClaimStatus::Processing).unwrap();
    let claim_id = store.seed(claim);

    let outcome = runner
        .run(claim_id, StageName::RoutingDecision)
        .await
        .unwrap();
    assert!(matches!(outcome, StageOutcome::Completed(Some(_))));

    let claim = store.claim(claim_id).unwrap();
    assert_eq!(claim.status, ClaimStatus::Processing);
    assert_eq!(claim.confidence_score, Some(100));
}

#[tokio::test]
async fn test_submission_records_confirmation() {
    init_test_logging();
    let (runner, store) = runner_with_store();
    let mut claim = clean_claim();
    claim.update_status(ClaimStatus::Processing).unwrap();
    let claim_id = store.seed(claim);

    let outcome = runner.run(claim_id, StageName::Submission).await.unwrap();
    match outcome {
        StageOutcome::Completed(Some(result)) => {
            let confirmation = result["confirmation_number"].as_str().unwrap();
            assert!(confirmation.starts_with("SUB-"));
        }
        _ => panic!("expected submission result"),
    }
    assert_eq!(
        store.claim(claim_id).unwrap().status,
        ClaimStatus::Submitted
    );
}

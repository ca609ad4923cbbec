//! Fully wired pipeline on in-memory adapters

use std::sync::Arc;

use tokio::sync::RwLock;

use domain_rules::RulesEngine;
use infra_queue::{InMemoryBroker, QueueClient, QueueConfig};
use orchestration::{PipelineConfig, WorkflowError, WorkflowOrchestrator};

use crate::mocks::{InMemoryAuditSink, InMemoryClaimStore, MockFieldExtractor, MockOcrService};

/// A complete pipeline for integration tests
pub struct TestPipeline {
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub store: Arc<InMemoryClaimStore>,
    pub audit: Arc<InMemoryAuditSink>,
    pub queue: Arc<QueueClient>,
}

impl TestPipeline {
    /// Pipeline with well-behaved OCR and extraction mocks
    pub async fn new() -> Result<Self, WorkflowError> {
        Self::with_services(
            Arc::new(MockOcrService::new()),
            Arc::new(MockFieldExtractor::default()),
        )
        .await
    }

    pub async fn with_services(
        ocr: Arc<MockOcrService>,
        extractor: Arc<MockFieldExtractor>,
    ) -> Result<Self, WorkflowError> {
        let store = Arc::new(InMemoryClaimStore::new());
        let audit = InMemoryAuditSink::new();
        // Millisecond backoff keeps retry tests fast
        let queue_config = QueueConfig {
            max_attempts: 3,
            backoff_base_ms: 1,
        };
        let queue = Arc::new(QueueClient::new(
            Arc::new(InMemoryBroker::new()),
            queue_config,
        ));
        let rules = Arc::new(RwLock::new(RulesEngine::new()));

        let orchestrator = WorkflowOrchestrator::new(
            Arc::clone(&store) as _,
            ocr,
            extractor,
            Arc::clone(&audit) as _,
            Arc::clone(&queue),
            rules,
            PipelineConfig::default(),
        )
        .await?;

        Ok(Self {
            orchestrator,
            store,
            audit,
            queue,
        })
    }
}

//! Pipeline configuration

use serde::Deserialize;

/// Orchestrator settings, loaded from `PIPELINE_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Concurrent workflow advance workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Queue for OCR text-extraction jobs
    #[serde(default = "default_ocr_queue")]
    pub ocr_queue: String,
    /// Queue for AI field-extraction jobs
    #[serde(default = "default_extraction_queue")]
    pub extraction_queue: String,
}

fn default_worker_count() -> usize {
    4
}

fn default_ocr_queue() -> String {
    "claims.ocr".to_string()
}

fn default_extraction_queue() -> String {
    "claims.extraction".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            ocr_queue: default_ocr_queue(),
            extraction_queue: default_extraction_queue(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("PIPELINE"))
            .build()?
            .try_deserialize()
    }
}

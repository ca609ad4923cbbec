//! Queue subsystem errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue not declared: {0}")]
    QueueNotFound(String),

    #[error("Queue closed: {0}")]
    Closed(String),

    #[error("Publish failed on {queue}: {reason}")]
    PublishFailed { queue: String, reason: String },

    #[error("Job tracker dropped before the job finished")]
    TrackerDropped,

    #[error("Queue configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

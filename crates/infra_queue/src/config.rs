//! Queue configuration

use std::time::Duration;

use serde::Deserialize;

/// Retry policy for queue consumers
///
/// Loaded from `QUEUE_*` environment variables, e.g. `QUEUE_MAX_ATTEMPTS=5`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Deliveries before a message is dead-lettered
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base unit of the exponential backoff schedule
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1_000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl QueueConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("QUEUE"))
            .build()?
            .try_deserialize()
    }

    /// Backoff before redelivery number `attempts + 1`: base * 2^attempts
    ///
    /// The exponent is capped so a misconfigured cap cannot overflow.
    pub fn backoff(&self, attempts: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1 << attempts.min(16)))
    }
}

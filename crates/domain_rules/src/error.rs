//! Rules engine errors

use thiserror::Error;

/// Errors that can occur managing the rule registry
///
/// Evaluation itself never fails: malformed conditions evaluate false.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Rule not found: {0}")]
    RuleNotFound(String),
}

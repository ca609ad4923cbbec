//! Test Utilities Crate
//!
//! Shared test infrastructure for the claims pipeline test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built claims and extracted-field sets
//! - `builders`: Builder patterns for test data construction
//! - `mocks`: In-memory adapters for the pipeline's ports
//! - `harness`: A fully wired pipeline running on in-memory adapters
//! - `logging`: Tracing setup for tests

pub mod builders;
pub mod fixtures;
pub mod harness;
pub mod logging;
pub mod mocks;

pub use builders::*;
pub use fixtures::*;
pub use harness::*;
pub use logging::*;
pub use mocks::*;

//! Core Kernel - Foundational types and utilities for the claims intake system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers
//! - Port/adapter abstractions for external collaborators

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{
    ClaimId, DocumentId, RuleId, MessageId, WorkflowId, AuditEventId,
};
pub use ports::{PortError, DomainPort};

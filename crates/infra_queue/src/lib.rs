//! Queue and Retry Subsystem
//!
//! Publish/consume abstraction that hands long-running stages (OCR, AI
//! extraction) to out-of-process workers. Delivery failures are retried
//! with exponential backoff up to a fixed attempt cap, then moved to the
//! queue's paired dead-letter queue. Messages are never silently dropped.

pub mod broker;
pub mod client;
pub mod config;
pub mod error;
pub mod message;

pub use broker::{dlq_name, InMemoryBroker, MessageBroker, QueueMetrics};
pub use client::{JobHandle, JobOutcome, MessageHandler, QueueClient};
pub use config::QueueConfig;
pub use error::QueueError;
pub use message::QueueMessage;

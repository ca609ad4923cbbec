//! Message broker abstraction and the in-process implementation
//!
//! The pipeline talks to `MessageBroker`; production deploys a real broker
//! adapter behind it, tests and single-node deployments use
//! [`InMemoryBroker`]. Declaring a queue always declares its paired
//! dead-letter queue, so every queue has somewhere for poison messages
//! to land.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::error::QueueError;
use crate::message::QueueMessage;

/// Name of the dead-letter queue paired with `queue`
pub fn dlq_name(queue: &str) -> String {
    format!("{queue}.dlq")
}

/// Counters for one queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueMetrics {
    pub published: u64,
    pub delivered: u64,
    /// published - delivered
    pub depth: u64,
}

#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Declares a queue and its paired dead-letter queue; idempotent
    async fn declare_queue(&self, name: &str) -> Result<(), QueueError>;

    async fn publish(&self, queue: &str, message: QueueMessage) -> Result<(), QueueError>;

    /// Waits for the next message; errors when the queue is closed
    async fn receive(&self, queue: &str) -> Result<QueueMessage, QueueError>;

    /// Takes a message if one is immediately available
    async fn try_receive(&self, queue: &str) -> Result<Option<QueueMessage>, QueueError>;

    /// Counter snapshot across all declared queues
    async fn metrics(&self) -> HashMap<String, QueueMetrics>;
}

struct Channel {
    tx: UnboundedSender<QueueMessage>,
    rx: Arc<tokio::sync::Mutex<UnboundedReceiver<QueueMessage>>>,
    published: u64,
    delivered: u64,
}

impl Channel {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(tokio::sync::Mutex::new(rx)),
            published: 0,
            delivered: 0,
        }
    }
}

/// In-process broker backed by tokio channels
#[derive(Default)]
pub struct InMemoryBroker {
    queues: Mutex<HashMap<String, Channel>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_queues<T>(&self, f: impl FnOnce(&mut HashMap<String, Channel>) -> T) -> T {
        let mut queues = self.queues.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut queues)
    }

    fn receiver(
        &self,
        queue: &str,
    ) -> Result<Arc<tokio::sync::Mutex<UnboundedReceiver<QueueMessage>>>, QueueError> {
        self.with_queues(|queues| {
            queues
                .get(queue)
                .map(|c| Arc::clone(&c.rx))
                .ok_or_else(|| QueueError::QueueNotFound(queue.to_string()))
        })
    }

    fn record_delivery(&self, queue: &str) {
        self.with_queues(|queues| {
            if let Some(channel) = queues.get_mut(queue) {
                channel.delivered += 1;
            }
        });
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn declare_queue(&self, name: &str) -> Result<(), QueueError> {
        self.with_queues(|queues| {
            for queue in [name.to_string(), dlq_name(name)] {
                queues.entry(queue).or_insert_with(Channel::new);
            }
        });
        debug!(queue = name, "queue declared");
        Ok(())
    }

    async fn publish(&self, queue: &str, message: QueueMessage) -> Result<(), QueueError> {
        self.with_queues(|queues| {
            let channel = queues
                .get_mut(queue)
                .ok_or_else(|| QueueError::QueueNotFound(queue.to_string()))?;
            channel
                .tx
                .send(message)
                .map_err(|e| QueueError::PublishFailed {
                    queue: queue.to_string(),
                    reason: e.to_string(),
                })?;
            channel.published += 1;
            Ok(())
        })
    }

    async fn receive(&self, queue: &str) -> Result<QueueMessage, QueueError> {
        let rx = self.receiver(queue)?;
        let message = {
            let mut rx = rx.lock().await;
            rx.recv()
                .await
                .ok_or_else(|| QueueError::Closed(queue.to_string()))?
        };
        self.record_delivery(queue);
        Ok(message)
    }

    async fn try_receive(&self, queue: &str) -> Result<Option<QueueMessage>, QueueError> {
        let rx = self.receiver(queue)?;
        let message = {
            let mut rx = rx.lock().await;
            rx.try_recv().ok()
        };
        if message.is_some() {
            self.record_delivery(queue);
        }
        Ok(message)
    }

    async fn metrics(&self) -> HashMap<String, QueueMetrics> {
        self.with_queues(|queues| {
            queues
                .iter()
                .map(|(name, c)| {
                    (
                        name.clone(),
                        QueueMetrics {
                            published: c.published,
                            delivered: c.delivered,
                            depth: c.published.saturating_sub(c.delivered),
                        },
                    )
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_then_receive() {
        let broker = InMemoryBroker::new();
        broker.declare_queue("ocr").await.unwrap();

        let msg = QueueMessage::new("ocr_document", json!({"n": 1}));
        let id = msg.id;
        broker.publish("ocr", msg).await.unwrap();

        let received = broker.receive("ocr").await.unwrap();
        assert_eq!(received.id, id);
    }

    #[tokio::test]
    async fn test_declare_creates_paired_dlq() {
        let broker = InMemoryBroker::new();
        broker.declare_queue("ocr").await.unwrap();

        let msg = QueueMessage::new("poison", json!({}));
        broker.publish(&dlq_name("ocr"), msg).await.unwrap();
        assert!(broker.try_receive("ocr.dlq").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_publish_to_undeclared_queue_fails() {
        let broker = InMemoryBroker::new();
        let result = broker.publish("nope", QueueMessage::new("x", json!({}))).await;
        assert!(matches!(result, Err(QueueError::QueueNotFound(_))));
    }

    #[tokio::test]
    async fn test_try_receive_empty_is_none() {
        let broker = InMemoryBroker::new();
        broker.declare_queue("ocr").await.unwrap();
        assert!(broker.try_receive("ocr").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_metrics_track_depth() {
        let broker = InMemoryBroker::new();
        broker.declare_queue("ocr").await.unwrap();
        broker
            .publish("ocr", QueueMessage::new("a", json!({})))
            .await
            .unwrap();
        broker
            .publish("ocr", QueueMessage::new("b", json!({})))
            .await
            .unwrap();
        broker.receive("ocr").await.unwrap();

        let metrics = broker.metrics().await;
        let ocr = metrics.get("ocr").unwrap();
        assert_eq!(ocr.published, 2);
        assert_eq!(ocr.delivered, 1);
        assert_eq!(ocr.depth, 1);
    }
}

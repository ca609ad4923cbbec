//! Queue client: consumer loop, retry policy, and job tracking
//!
//! The client owns the retry policy. A handler failure schedules a delayed
//! redelivery with exponential backoff; once the attempt cap is reached the
//! message moves to the dead-letter queue and the publisher (if it kept the
//! job handle) is told the job is dead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use core_kernel::MessageId;

use crate::broker::{dlq_name, MessageBroker};
use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::message::QueueMessage;

/// Processes one delivery of a queue message
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, message: &QueueMessage) -> anyhow::Result<()>;
}

/// Terminal fate of a published job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    DeadLettered { reason: String },
}

/// Awaitable handle returned by [`QueueClient::publish_job`]
pub struct JobHandle {
    pub message_id: MessageId,
    rx: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    /// Waits for the job to complete or dead-letter
    pub async fn outcome(self) -> Result<JobOutcome, QueueError> {
        self.rx.await.map_err(|_| QueueError::TrackerDropped)
    }
}

type Tracker = Arc<Mutex<HashMap<MessageId, oneshot::Sender<JobOutcome>>>>;

/// Publisher/consumer facade over a [`MessageBroker`]
pub struct QueueClient {
    broker: Arc<dyn MessageBroker>,
    config: QueueConfig,
    tracker: Tracker,
}

impl QueueClient {
    pub fn new(broker: Arc<dyn MessageBroker>, config: QueueConfig) -> Self {
        Self {
            broker,
            config,
            tracker: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn broker(&self) -> &Arc<dyn MessageBroker> {
        &self.broker
    }

    /// Declares a queue (and its dead-letter queue)
    pub async fn declare(&self, queue: &str) -> Result<(), QueueError> {
        self.broker.declare_queue(queue).await
    }

    /// Publishes a message and returns a handle that resolves when the job
    /// completes or dead-letters
    pub async fn publish_job(
        &self,
        queue: &str,
        message: QueueMessage,
    ) -> Result<JobHandle, QueueError> {
        let message_id = message.id;
        let (tx, rx) = oneshot::channel();
        lock_tracker(&self.tracker).insert(message_id, tx);

        if let Err(e) = self.broker.publish(queue, message).await {
            lock_tracker(&self.tracker).remove(&message_id);
            return Err(e);
        }
        Ok(JobHandle { message_id, rx })
    }

    /// Starts a consumer loop for `queue`; runs until the queue closes or
    /// the returned task is aborted
    pub fn subscribe<H: MessageHandler>(&self, queue: &str, handler: Arc<H>) -> JoinHandle<()> {
        let broker = Arc::clone(&self.broker);
        let tracker = Arc::clone(&self.tracker);
        let config = self.config.clone();
        let queue = queue.to_string();

        tokio::spawn(async move {
            loop {
                let mut message = match broker.receive(&queue).await {
                    Ok(message) => message,
                    Err(e) => {
                        debug!(queue, error = %e, "consumer stopping");
                        break;
                    }
                };
                message.attempts += 1;

                match handler.handle(&message).await {
                    Ok(()) => {
                        debug!(queue, message_id = %message.id, "message handled");
                        resolve(&tracker, message.id, JobOutcome::Completed);
                    }
                    Err(e) if message.attempts < config.max_attempts => {
                        let delay = config.backoff(message.attempts);
                        warn!(
                            queue,
                            message_id = %message.id,
                            attempt = message.attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "handler failed; scheduling redelivery"
                        );
                        let broker = Arc::clone(&broker);
                        let tracker = Arc::clone(&tracker);
                        let queue = queue.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            if let Err(e) = broker.publish(&queue, message.clone()).await {
                                error!(queue, message_id = %message.id, error = %e, "redelivery failed");
                                resolve(
                                    &tracker,
                                    message.id,
                                    JobOutcome::DeadLettered {
                                        reason: e.to_string(),
                                    },
                                );
                            }
                        });
                    }
                    Err(e) => {
                        error!(
                            queue,
                            message_id = %message.id,
                            attempts = message.attempts,
                            error = %e,
                            "attempt cap reached; dead-lettering"
                        );
                        let reason = e.to_string();
                        let message_id = message.id;
                        if let Err(publish_err) =
                            broker.publish(&dlq_name(&queue), message).await
                        {
                            error!(queue, %message_id, error = %publish_err, "dead-letter publish failed");
                        }
                        resolve(&tracker, message_id, JobOutcome::DeadLettered { reason });
                    }
                }
            }
        })
    }
}

fn lock_tracker(
    tracker: &Tracker,
) -> std::sync::MutexGuard<'_, HashMap<MessageId, oneshot::Sender<JobOutcome>>> {
    tracker.lock().unwrap_or_else(|e| e.into_inner())
}

fn resolve(tracker: &Tracker, message_id: MessageId, outcome: JobOutcome) {
    if let Some(tx) = lock_tracker(tracker).remove(&message_id) {
        // The publisher may have dropped its handle; that is fine.
        let _ = tx.send(outcome);
    }
}

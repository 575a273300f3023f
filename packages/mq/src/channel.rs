use async_trait::async_trait;
use broccoli_queue::queue::BroccoliQueue;
use common::EventEnvelope;
use tracing::debug;

use crate::error::MqError;

/// Transport a publisher hands finished envelopes to.
#[async_trait]
pub trait EventChannel: Send + Sync {
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), MqError>;

    /// Release transport resources. Called once, after in-flight sends drained.
    async fn close(&self) -> Result<(), MqError> {
        Ok(())
    }
}

/// Channel backed by a broccoli queue.
///
/// The envelope key is used as the disambiguator, so every message for one
/// trace lands in the same fairness partition.
pub struct BroccoliChannel {
    queue: BroccoliQueue,
    queue_name: String,
}

impl BroccoliChannel {
    pub fn new(queue: BroccoliQueue, queue_name: impl Into<String>) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
        }
    }

    /// Open a pooled connection to the broker at `url`.
    pub async fn connect(
        url: &str,
        pool_size: u8,
        queue_name: impl Into<String>,
    ) -> Result<Self, MqError> {
        let queue = BroccoliQueue::builder(url)
            .pool_connections(pool_size)
            .build()
            .await?;
        Ok(Self::new(queue, queue_name))
    }
}

#[async_trait]
impl EventChannel for BroccoliChannel {
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), MqError> {
        let message = self
            .queue
            .publish(&self.queue_name, Some(envelope.key.clone()), envelope, None)
            .await?;
        debug!(
            queue = %self.queue_name,
            message_id = %message.task_id,
            key = %envelope.key,
            "Event published"
        );
        Ok(())
    }
}

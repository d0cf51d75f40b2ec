use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use super::{MessageError, MessageQueue};

/// Serializes events to JSON and hands them to the message bus.
///
/// A single attempt is made per event; the caller decides what a failure
/// means.
#[derive(Clone)]
pub struct EventPublisher {
    queue: Arc<dyn MessageQueue>,
}

impl EventPublisher {
    /// Create a new event publisher
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    /// Publish an event to a topic and wait for the broker to accept it
    pub async fn publish<T: Serialize + ?Sized>(
        &self,
        topic: &str,
        event: &T,
    ) -> Result<(), MessageError> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| MessageError::Serialization(format!("Failed to serialize event: {}", e)))?;

        if let Err(e) = self.queue.publish(topic, &payload).await {
            error!("Failed to publish event to {}: {}", topic, e);
            return Err(e);
        }

        info!("Published event to topic: {}", topic);
        Ok(())
    }

    /// Whether the underlying bus is reachable
    pub async fn health_check(&self) -> bool {
        self.queue.health_check().await
    }
}

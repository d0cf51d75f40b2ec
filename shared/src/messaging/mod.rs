/// Messaging and event handling utilities
pub mod event_types;
pub mod kafka_client;
pub mod publisher;

pub use event_types::*;
pub use kafka_client::{KafkaClient, KafkaConfig};
pub use publisher::EventPublisher;

/// Message bus capability: publish a payload to a topic and return only once
/// the broker has accepted it.
#[async_trait::async_trait]
pub trait MessageQueue: Send + Sync {
    /// Publish a message to a topic, waiting for delivery confirmation
    async fn publish(&self, topic: &str, message: &[u8]) -> Result<(), MessageError>;

    /// Whether the broker is currently reachable
    async fn health_check(&self) -> bool;
}

/// Message queue errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Delivery error: {0}")]
    Delivery(String),
}

pub type MessageResult<T> = Result<T, MessageError>;

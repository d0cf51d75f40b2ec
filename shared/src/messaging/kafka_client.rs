//! Kafka-backed implementation of the message bus capability.
//!
//! Publishing waits for the broker's delivery report, so a successful return
//! means the record sits in the partition log. There is no retry and no
//! timeout beyond librdkafka's own `message.timeout.ms`.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{debug, info, warn};

use super::{MessageError, MessageQueue, MessageResult};

const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka client configuration
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub client_id: String,
}

impl KafkaConfig {
    /// Parse a comma-separated bootstrap list such as `kafka-1:9092,kafka-2:9092`
    pub fn from_bootstrap_servers(servers: &str, client_id: impl Into<String>) -> Self {
        Self {
            brokers: servers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            client_id: client_id.into(),
        }
    }

    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["kafka:9092".to_string()],
            client_id: "intake-service".to_string(),
        }
    }
}

/// Long-lived producer shared by every request
pub struct KafkaClient {
    producer: FutureProducer,
}

impl KafkaClient {
    pub fn new(config: KafkaConfig) -> MessageResult<Self> {
        if config.brokers.is_empty() {
            return Err(MessageError::Connection(
                "No Kafka bootstrap servers configured".to_string(),
            ));
        }

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.bootstrap_servers())
            .set("client.id", config.client_id.as_str())
            .create()
            .map_err(|e| MessageError::Connection(format!("Failed to create Kafka producer: {}", e)))?;

        info!(brokers = %config.bootstrap_servers(), "Kafka producer created");

        Ok(Self { producer })
    }
}

#[async_trait::async_trait]
impl MessageQueue for KafkaClient {
    async fn publish(&self, topic: &str, message: &[u8]) -> Result<(), MessageError> {
        let record = FutureRecord::<(), [u8]>::to(topic).payload(message);

        match self.producer.send(record, Timeout::Never).await {
            Ok((partition, offset)) => {
                debug!(topic, partition, offset, "Kafka delivery confirmed");
                Ok(())
            }
            Err((err, _)) => Err(MessageError::Delivery(err.to_string())),
        }
    }

    async fn health_check(&self) -> bool {
        let producer = self.producer.clone();

        // fetch_metadata blocks on the network
        let result = tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(None, METADATA_TIMEOUT)
                .map(|metadata| metadata.brokers().len())
        })
        .await;

        match result {
            Ok(Ok(brokers)) => brokers > 0,
            Ok(Err(e)) => {
                warn!("Kafka metadata request failed: {}", e);
                false
            }
            Err(e) => {
                warn!("Kafka health check task failed: {}", e);
                false
            }
        }
    }
}

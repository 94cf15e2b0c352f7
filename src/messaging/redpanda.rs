use std::time::Duration;

use anyhow::{Context, Result};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};

/// Delivery timeout for a single publish
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Producer side of the orders topic. The service itself only consumes;
/// this is used by the `publisher` tool to feed it.
pub struct OrderPublisher {
    producer: FutureProducer,
}

impl OrderPublisher {
    pub fn new(brokers: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .context("Failed to create Redpanda producer")?;

        Ok(Self { producer })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        self.producer
            .send(record, rdkafka::util::Timeout::After(SEND_TIMEOUT))
            .await
            .map_err(|(e, _)| anyhow::anyhow!("Kafka send error: {}", e))?;

        tracing::info!(
            topic = %topic,
            key = %key,
            payload_bytes = payload.len(),
            "Published to Redpanda"
        );
        Ok(())
    }
}

use std::time::Duration;

use anyhow::{Context, Result};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};
use tokio::sync::watch;

use crate::pipeline::IngestPipeline;

// ============================================================================
// Order Consumer - feeds the ingestion pipeline from Redpanda
// ============================================================================
//
// One consumer instance processes its messages strictly one after another:
// a message is fully ingested (or dropped) before the next one is read.
// Several instances in the same consumer group share the topic's partitions
// and run concurrently.
//
// Offsets are committed after processing, whatever the outcome. A message
// that failed decode, validation or persistence is not redelivered; transient
// store failures are retried inside the pipeline when configured.
//
// ============================================================================

/// Pause after a broker-level error before polling again
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

pub struct OrderConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl OrderConsumer {
    pub fn new(brokers: &str, group_id: &str, topic: &str) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .context("Failed to create Redpanda consumer")?;

        consumer
            .subscribe(&[topic])
            .with_context(|| format!("Failed to subscribe to topic {topic}"))?;

        Ok(Self {
            consumer,
            topic: topic.to_string(),
        })
    }

    /// Consume until `shutdown` flips to true or its sender goes away
    pub async fn run(self, worker: usize, pipeline: IngestPipeline, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(worker = worker, topic = %self.topic, "🎯 Order consumer started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let received = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                received = self.consumer.recv() => received.map(|msg| {
                    let position = (msg.topic().to_string(), msg.partition(), msg.offset());
                    (msg.payload().map(<[u8]>::to_vec), position)
                }),
            };

            match received {
                Ok((payload, (topic, partition, offset))) => {
                    match payload {
                        Some(payload) => {
                            let outcome = pipeline.handle(&payload).await;
                            tracing::debug!(
                                worker = worker,
                                partition = partition,
                                offset = offset,
                                outcome = outcome.as_str(),
                                "Message handled"
                            );
                        }
                        None => {
                            tracing::warn!(partition = partition, offset = offset, "Empty message, skipping");
                        }
                    }

                    if let Err(e) = self.commit(&topic, partition, offset) {
                        tracing::warn!(error = %e, partition = partition, offset = offset, "Offset commit failed");
                    }
                }
                Err(e) => {
                    tracing::error!(worker = worker, error = %e, "Redpanda consumer error");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }

        tracing::info!(worker = worker, "🛑 Order consumer stopped");
    }

    fn commit(&self, topic: &str, partition: i32, offset: i64) -> Result<()> {
        let mut positions = TopicPartitionList::new();
        positions.add_partition_offset(topic, partition, Offset::Offset(offset + 1))?;
        self.consumer.commit(&positions, CommitMode::Async)?;
        Ok(())
    }
}

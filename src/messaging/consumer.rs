use std::future::Future;
use std::sync::Arc;

use futures_util::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{BorrowedMessage, Headers, Message};

use super::processor::EventProcessor;
use crate::config::KafkaConfig;

// ============================================================================
// Redpanda Consumer - feeds (type header, raw bytes) into the processor
// ============================================================================
//
// Group membership, partition assignment and offset storage are left to
// librdkafka. Offsets are committed only after a message was handled; a
// failed message is logged and skipped, so redelivery follows the broker's
// commit semantics.
//
// ============================================================================

/// Header carrying the logical event type of a record.
pub const TYPE_HEADER: &str = "type";

pub struct RedpandaConsumer {
    consumer: StreamConsumer,
    processor: Arc<EventProcessor>,
}

impl RedpandaConsumer {
    pub fn new(config: &KafkaConfig, processor: Arc<EventProcessor>) -> Result<Self, KafkaError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("group.id", &config.consumer.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &config.consumer.auto_offset_reset)
            .set("partition.assignment.strategy", "roundrobin")
            .create()?;

        let topics = [config.topics.app_events.as_str()];
        consumer.subscribe(&topics)?;

        tracing::info!(
            brokers = ?config.brokers,
            group_id = %config.consumer.group_id,
            topics = ?topics,
            "Subscribed to Redpanda topics"
        );

        Ok(Self { consumer, processor })
    }

    /// Consume until `shutdown` resolves or the stream ends.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        let mut stream = self.consumer.stream();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping consumer");
                    return;
                }
                next = stream.next() => {
                    match next {
                        Some(Ok(message)) => self.handle(&message).await,
                        Some(Err(e)) => tracing::error!(error = %e, "Kafka consumer error"),
                        None => {
                            tracing::warn!("Consumer stream ended");
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn handle(&self, message: &BorrowedMessage<'_>) {
        let event_type = message
            .headers()
            .and_then(|headers| find_header(headers.iter().map(|h| (h.key, h.value)), TYPE_HEADER));

        let Some(event_type) = event_type else {
            tracing::error!(
                topic = %message.topic(),
                partition = message.partition(),
                offset = message.offset(),
                "Message missing type header"
            );
            return;
        };

        let payload = message.payload().unwrap_or_default();

        match self.processor.process(&event_type, payload).await {
            Ok(()) => {
                if let Err(e) = self.consumer.commit_message(message, CommitMode::Async) {
                    tracing::error!(error = %e, "Failed to commit offset");
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    stage = e.stage(),
                    event_type = %event_type,
                    topic = %message.topic(),
                    partition = message.partition(),
                    offset = message.offset(),
                    "Failed to handle message"
                );
            }
        }
    }
}

/// First non-empty UTF-8 value for `key`.
fn find_header<'a>(
    headers: impl IntoIterator<Item = (&'a str, Option<&'a [u8]>)>,
    key: &str,
) -> Option<String> {
    headers
        .into_iter()
        .find(|(k, _)| *k == key)
        .and_then(|(_, value)| value)
        .and_then(|value| std::str::from_utf8(value).ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

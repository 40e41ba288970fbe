//! Kafka consumer implementation for the order sync pipeline.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    error::KafkaError,
    message::Message as KafkaMessage,
    Offset, TopicPartitionList,
};
use tracing::{debug, info};

use crate::consumer::{ConsumedMessage, MessageConsumer, MessagePosition};
use crate::errors::ConsumerError;

const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka consumer for a single topic with manual offset commits.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Kafka broker addresses (comma-separated)
    /// * `group_id` - Consumer group ID
    /// * `topic` - Topic to subscribe to
    ///
    /// # Returns
    ///
    /// * `Ok(KafkaConsumer)` - A new consumer instance
    /// * `Err(ConsumerError)` - If consumer creation fails
    pub fn new(brokers: &str, group_id: &str, topic: &str) -> Result<Self, ConsumerError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(|e| ConsumerError::subscription(e.to_string()))?;

        info!(brokers = %brokers, group_id = %group_id, topic = %topic, "Created Kafka consumer");

        Ok(Self {
            consumer,
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl MessageConsumer for KafkaConsumer {
    fn subscribe(&self) -> Result<(), ConsumerError> {
        self.consumer
            .subscribe(&[self.topic.as_str()])
            .map_err(|e| ConsumerError::subscription(e.to_string()))?;

        info!(topic = %self.topic, "Subscribed to Kafka topic");
        Ok(())
    }

    async fn poll(&self, timeout: Duration) -> Result<Option<ConsumedMessage>, ConsumerError> {
        let message = match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => return Ok(None),
            Ok(Err(KafkaError::PartitionEOF(partition))) => {
                debug!(partition = partition, "Reached end of partition");
                return Ok(None);
            }
            Ok(Err(e)) => return Err(ConsumerError::read(e.to_string())),
            Ok(Ok(message)) => message,
        };

        let position = MessagePosition::new(message.topic(), message.partition(), message.offset());
        debug!(
            topic = %position.topic,
            partition = position.partition,
            offset = position.offset,
            "Received message"
        );

        Ok(Some(ConsumedMessage {
            position,
            key: message.key().map(<[u8]>::to_vec),
            payload: message.payload().map(<[u8]>::to_vec),
        }))
    }

    fn commit(&self, positions: &[MessagePosition]) -> Result<(), ConsumerError> {
        if positions.is_empty() {
            return Ok(());
        }

        // Kafka stores the offset of the next message to read.
        let mut tpl = TopicPartitionList::new();
        for position in positions {
            tpl.add_partition_offset(&position.topic, position.partition, Offset::Offset(position.offset + 1))
                .map_err(|e| ConsumerError::commit(e.to_string()))?;
        }

        self.consumer
            .commit(&tpl, CommitMode::Async)
            .map_err(|e| ConsumerError::commit(e.to_string()))
    }

    fn seek(&self, position: &MessagePosition) -> Result<(), ConsumerError> {
        self.consumer
            .seek(&position.topic, position.partition, Offset::Offset(position.offset), SEEK_TIMEOUT)
            .map_err(|e| ConsumerError::seek(e.to_string()))
    }
}

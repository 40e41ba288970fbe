//! Producer module for the order sync pipeline.
//!
//! Publishes resolved order documents to the document topic.

mod kafka_producer;

use async_trait::async_trait;

use crate::errors::PublishError;

pub use kafka_producer::KafkaProducer;

/// Publishes encoded documents to a fixed topic.
#[async_trait]
pub trait DocumentPublisher: Send + Sync {
    /// Hand one message to the producer.
    ///
    /// Returning `Ok` means the message was accepted for delivery, not that
    /// the broker acknowledged it.
    async fn publish(&self, key: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

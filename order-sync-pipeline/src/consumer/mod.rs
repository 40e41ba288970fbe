//! Consumer module for the order sync pipeline.
//!
//! [`MessageConsumer`] is the seam over the message channel; the Kafka
//! implementation lives in [`KafkaConsumer`]. [`BatchConsumer`] wraps any
//! consumer with bounded batch reads and batch-granular acknowledgement.

mod batch;
mod kafka_consumer;
mod message;

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::ConsumerError;

pub use batch::{BatchConsumer, BatchPolicy};
pub use kafka_consumer::KafkaConsumer;
pub use message::{ConsumedMessage, MessagePosition};

/// A subscription to one topic as a member of a consumer group.
///
/// Each worker owns its consumer exclusively.
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Attach to the configured topic.
    fn subscribe(&self) -> Result<(), ConsumerError>;

    /// Wait up to `timeout` for the next message.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(message))` - A message was read
    /// * `Ok(None)` - Nothing arrived before the timeout
    /// * `Err(ConsumerError::Read)` - Any other read failure
    async fn poll(&self, timeout: Duration) -> Result<Option<ConsumedMessage>, ConsumerError>;

    /// Acknowledge every message up to and including each position.
    fn commit(&self, positions: &[MessagePosition]) -> Result<(), ConsumerError>;

    /// Move the read cursor back so `position` is delivered again.
    fn seek(&self, position: &MessagePosition) -> Result<(), ConsumerError>;
}

//! Kafka producer with a single delivery-report task.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::future_producer::DeliveryFuture;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::errors::PublishError;
use crate::producer::DocumentPublisher;

/// A delivery awaiting its broker acknowledgement.
struct PendingDelivery {
    key: String,
    delivery: DeliveryFuture,
}

/// Kafka producer for one topic.
///
/// `publish` only enqueues. Broker acknowledgements are awaited by one
/// long-lived task started in [`KafkaProducer::new`], which logs failed
/// deliveries.
pub struct KafkaProducer {
    producer: FutureProducer,
    topic: String,
    deliveries: mpsc::UnboundedSender<PendingDelivery>,
}

impl KafkaProducer {
    /// Create a new Kafka producer and start its delivery-report task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(brokers: &str, topic: &str) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("compression.type", "zstd")
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| PublishError::Config(e.to_string()))?;

        let (deliveries, reports) = mpsc::unbounded_channel();
        tokio::spawn(report_deliveries(topic.to_string(), reports));

        info!(brokers = %brokers, topic = %topic, "Created Kafka producer");

        Ok(Self {
            producer,
            topic: topic.to_string(),
            deliveries,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl DocumentPublisher for KafkaProducer {
    #[instrument(skip(self, payload), fields(topic = %self.topic))]
    async fn publish(&self, key: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(&payload);

        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(e, _)| PublishError::Enqueue(e.to_string()))?;

        // The report task only stops when the producer is dropped.
        let _ = self.deliveries.send(PendingDelivery {
            key: key.to_string(),
            delivery,
        });

        Ok(())
    }
}

async fn report_deliveries(topic: String, mut reports: mpsc::UnboundedReceiver<PendingDelivery>) {
    while let Some(pending) = reports.recv().await {
        match pending.delivery.await {
            Ok(Ok(_)) => debug!(topic = %topic, key = %pending.key, "Delivered message"),
            Ok(Err((e, _))) => {
                error!(topic = %topic, key = %pending.key, error = %e, "Failed to deliver message")
            }
            Err(_) => error!(topic = %topic, key = %pending.key, "Delivery report was cancelled"),
        }
    }
    debug!(topic = %topic, "Delivery report task stopped");
}

//! Dependency initialization and wiring for order sync.

use std::sync::Arc;

use tracing::info;

use order_sync_pipeline::{
    BatchConsumer, ChangeRelay, IndexWriter, KafkaConsumer, KafkaProducer, SyncSupervisor,
};
use order_sync_repository::{HttpOrderLookup, IndexConfig, OpenSearchClient, OrderIndex, QueryTranslator};

use crate::api::ApiState;
use crate::config::Settings;
use crate::SyncError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Both consumer loops, ready to run.
    pub supervisor: SyncSupervisor,
    /// Shared state of the search endpoints.
    pub api_state: ApiState,
}

impl Dependencies {
    /// Connect to every external service and wire the pipeline.
    ///
    /// The search index must be healthy and the order index must exist (it
    /// is created when missing) before anything starts consuming.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(SyncError)` - If any client cannot be created or the index is unusable
    pub async fn new(settings: &Settings) -> Result<Self, SyncError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            kafka_broker = %settings.kafka_broker,
            change_topic = %settings.change_topic,
            document_topic = %settings.document_topic,
            "Initializing dependencies"
        );

        // Initialize OpenSearch client
        let index_client = OpenSearchClient::new(&settings.opensearch_url, IndexConfig::new(&settings.order_index))
            .await
            .map_err(|e| SyncError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        // Verify OpenSearch is reachable
        let healthy = index_client
            .health_check()
            .await
            .map_err(|e| SyncError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(SyncError::config("OpenSearch cluster is unhealthy"));
        }

        index_client.ensure_index_exists().await?;

        info!(index = index_client.index_name(), "OpenSearch connection verified");

        let index: Arc<dyn OrderIndex> = Arc::new(index_client);

        let lookup = HttpOrderLookup::new(&settings.order_api_url, settings.order_lookup_timeout)
            .map_err(|e| SyncError::config(format!("Failed to create order lookup client: {}", e)))?;

        let producer = KafkaProducer::new(&settings.kafka_broker, &settings.document_topic)
            .map_err(|e| SyncError::config(format!("Failed to create Kafka producer: {}", e)))?;

        let relay_consumer = KafkaConsumer::new(&settings.kafka_broker, &settings.relay_group_id, &settings.change_topic)
            .map_err(|e| SyncError::config(format!("Failed to create change consumer: {}", e)))?;

        let indexer_consumer =
            KafkaConsumer::new(&settings.kafka_broker, &settings.indexer_group_id, &settings.document_topic)
                .map_err(|e| SyncError::config(format!("Failed to create document consumer: {}", e)))?;

        info!(
            change_topic = relay_consumer.topic(),
            document_topic = producer.topic(),
            "Kafka clients created"
        );

        let relay = ChangeRelay::new(
            BatchConsumer::new(relay_consumer, settings.relay_batch)?,
            Arc::new(lookup),
            Arc::new(producer),
            index.clone(),
        );
        let writer = IndexWriter::new(BatchConsumer::new(indexer_consumer, settings.indexer_batch)?, index.clone());

        Ok(Self {
            supervisor: SyncSupervisor::for_pipeline(relay, writer),
            api_state: ApiState::new(index, QueryTranslator::default()),
        })
    }
}

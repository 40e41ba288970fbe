//! # Order Sync Pipeline
//!
//! This crate provides the two consumer loops that keep the order search
//! index in step with the order store, and the supervisor that runs them.
//!
//! ## Architecture
//!
//! 1. **Change relay**: reads order-changed notifications, resolves each
//!    identifier into its current document and publishes it; deletions go
//!    straight to the index
//! 2. **Index writer**: reads published documents and upserts them
//! 3. **Supervisor**: runs both loops and stops the process on the first
//!    fatal condition
//!
//! Both loops read through [`consumer::BatchConsumer`], which reads bounded
//! batches and acknowledges only the last position of each batch.

pub mod consumer;
pub mod errors;
pub mod indexer;
pub mod orchestrator;
pub mod producer;
pub mod relay;

#[cfg(test)]
mod testing;

pub use consumer::{BatchConsumer, BatchPolicy, ConsumedMessage, KafkaConsumer, MessageConsumer, MessagePosition};
pub use errors::{ConsumerError, PipelineError, PublishError};
pub use indexer::{IndexReport, IndexWriter};
pub use orchestrator::SyncSupervisor;
pub use producer::{DocumentPublisher, KafkaProducer};
pub use relay::{ChangeRelay, RelayReport};

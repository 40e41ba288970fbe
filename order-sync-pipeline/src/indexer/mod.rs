//! Index writer: keeps the search index at the latest document per order.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use order_sync_repository::OrderIndex;
use order_sync_shared::OrderDocument;

use crate::consumer::{BatchConsumer, MessageConsumer};
use crate::errors::{ConsumerError, PipelineError};

/// Pause after a failed batch read before reading again.
const READ_ERROR_BACKOFF: Duration = Duration::from_secs(1);

const WORKER_NAME: &str = "index-writer";

/// Outcome of one index batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub read: usize,
    pub malformed: usize,
    pub indexed: usize,
    pub failed: usize,
    pub committed: bool,
}

pub struct IndexWriter<C> {
    batches: BatchConsumer<C>,
    index: Arc<dyn OrderIndex>,
}

impl<C: MessageConsumer> IndexWriter<C> {
    pub fn new(batches: BatchConsumer<C>, index: Arc<dyn OrderIndex>) -> Self {
        Self { batches, index }
    }

    pub fn batches(&self) -> &BatchConsumer<C> {
        &self.batches
    }

    /// Subscribe, then index batches forever.
    ///
    /// Only a failed subscription ends the loop.
    pub async fn run(mut self) -> Result<(), PipelineError> {
        self.batches
            .subscribe()
            .map_err(|e| PipelineError::subscription(WORKER_NAME, e))?;

        info!(worker = WORKER_NAME, "Starting index writer");

        loop {
            if let Err(e) = self.run_once().await {
                error!(worker = WORKER_NAME, error = %e, "Batch abandoned");
                tokio::time::sleep(READ_ERROR_BACKOFF).await;
            }
        }
    }

    /// Read one batch of order documents and upsert each of them.
    ///
    /// Upserts are idempotent by order id, so the batch is acknowledged
    /// even when some of them failed.
    #[instrument(skip(self))]
    pub async fn run_once(&mut self) -> Result<IndexReport, ConsumerError> {
        let messages = match self.batches.read_batch().await {
            Ok(messages) => messages,
            Err(e) => {
                if let Err(seek) = self.batches.rewind() {
                    warn!(error = %seek, "Abandoned messages may not be redelivered");
                }
                return Err(e);
            }
        };

        let mut report = IndexReport {
            read: messages.len(),
            ..IndexReport::default()
        };

        for message in &messages {
            let document: OrderDocument = match serde_json::from_slice(message.payload()) {
                Ok(document) => document,
                Err(e) => {
                    error!(offset = message.position.offset, error = %e, "Skipping malformed order document");
                    report.malformed += 1;
                    continue;
                }
            };

            match self.index.upsert(&document).await {
                Ok(()) => {
                    debug!(order_id = %document.id, "Indexed order");
                    report.indexed += 1;
                }
                Err(e) => {
                    error!(order_id = %document.id, error = %e, "Failed to index order");
                    report.failed += 1;
                }
            }
        }

        match self.batches.commit_last() {
            Ok(()) => report.committed = true,
            Err(e) => error!(error = %e, "Failed to commit document batch"),
        }

        if report.read > 0 {
            info!(
                read = report.read,
                indexed = report.indexed,
                failed = report.failed,
                "Indexed document batch"
            );
        }

        Ok(report)
    }
}

//! Change relay: turns "an order changed" into "here is the order now".
//!
//! Each batch of change events is split by kind. Deletions are applied to
//! the search index as they are read. Creations and updates are resolved
//! through the order lookup once the batch is complete, and every resolved
//! document is published to the document topic for the index writer.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use order_sync_repository::{OrderIndex, OrderLookup};
use order_sync_shared::{ChangeEvent, ChangeKind};

use crate::consumer::{BatchConsumer, MessageConsumer};
use crate::errors::{ConsumerError, PipelineError};
use crate::producer::DocumentPublisher;

/// Pause before reading again after a batch was not acknowledged. Doubles
/// while batches keep failing, up to `MAX_RETRY_DELAY`.
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

const WORKER_NAME: &str = "change-relay";

/// Outcome of one relay batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub read: usize,
    pub malformed: usize,
    pub unknown: usize,
    pub deleted: usize,
    pub delete_failures: usize,
    pub resolved: usize,
    /// Lookups answered with "no such order".
    pub not_found: usize,
    pub lookup_failures: usize,
    /// Failed lookups that never reached the order service.
    pub unreachable: usize,
    pub published: usize,
    pub publish_failures: usize,
    /// Whether the batch was acknowledged.
    pub committed: bool,
}

impl RelayReport {
    /// Every lookup of the batch failed without reaching the order service.
    ///
    /// Only then is the batch redelivered. A lookup failing for one order is
    /// logged and skipped.
    pub fn order_service_unreachable(&self) -> bool {
        self.unreachable > 0 && self.unreachable == self.resolved + self.not_found + self.lookup_failures
    }
}

/// How long to wait before the next batch, given the previous wait.
fn next_retry_delay(outcome: &Result<RelayReport, ConsumerError>, previous: Option<Duration>) -> Option<Duration> {
    match outcome {
        Ok(report) if report.committed => None,
        _ => Some(previous.map_or(INITIAL_RETRY_DELAY, |delay| {
            std::cmp::min(delay * 2, MAX_RETRY_DELAY)
        })),
    }
}

pub struct ChangeRelay<C> {
    batches: BatchConsumer<C>,
    lookup: Arc<dyn OrderLookup>,
    publisher: Arc<dyn DocumentPublisher>,
    index: Arc<dyn OrderIndex>,
}

impl<C: MessageConsumer> ChangeRelay<C> {
    pub fn new(
        batches: BatchConsumer<C>,
        lookup: Arc<dyn OrderLookup>,
        publisher: Arc<dyn DocumentPublisher>,
        index: Arc<dyn OrderIndex>,
    ) -> Self {
        Self {
            batches,
            lookup,
            publisher,
            index,
        }
    }

    pub fn batches(&self) -> &BatchConsumer<C> {
        &self.batches
    }

    /// Subscribe, then relay batches forever.
    ///
    /// Only a failed subscription ends the loop.
    pub async fn run(mut self) -> Result<(), PipelineError> {
        self.batches
            .subscribe()
            .map_err(|e| PipelineError::subscription(WORKER_NAME, e))?;

        info!(worker = WORKER_NAME, "Starting change relay");

        let mut retry_delay = None;
        loop {
            let outcome = self.run_once().await;
            if let Err(e) = &outcome {
                error!(worker = WORKER_NAME, error = %e, "Batch abandoned");
            }

            retry_delay = next_retry_delay(&outcome, retry_delay);
            if let Some(delay) = retry_delay {
                debug!(delay_ms = delay.as_millis() as u64, "Backing off before next batch");
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Read and relay one batch.
    ///
    /// # Returns
    ///
    /// * `Ok(RelayReport)` - The batch was read; per-message failures are counted
    /// * `Err(ConsumerError)` - The read failed and the batch was abandoned
    #[instrument(skip(self))]
    pub async fn run_once(&mut self) -> Result<RelayReport, ConsumerError> {
        let messages = match self.batches.read_batch().await {
            Ok(messages) => messages,
            Err(e) => {
                if let Err(seek) = self.batches.rewind() {
                    warn!(error = %seek, "Abandoned messages may not be redelivered");
                }
                return Err(e);
            }
        };

        let mut report = RelayReport {
            read: messages.len(),
            ..RelayReport::default()
        };
        let mut to_resolve: Vec<String> = Vec::new();

        for message in &messages {
            let event: ChangeEvent = match serde_json::from_slice(message.payload()) {
                Ok(event) => event,
                Err(e) => {
                    error!(offset = message.position.offset, error = %e, "Skipping malformed change event");
                    report.malformed += 1;
                    continue;
                }
            };

            match event.change_kind {
                ChangeKind::Created | ChangeKind::Updated => to_resolve.push(event.order_id),
                ChangeKind::Deleted => match self.index.delete_by_id(&event.order_id).await {
                    Ok(()) => {
                        debug!(order_id = %event.order_id, "Removed order from index");
                        report.deleted += 1;
                    }
                    Err(e) => {
                        error!(order_id = %event.order_id, error = %e, "Failed to remove order from index");
                        report.delete_failures += 1;
                    }
                },
                ChangeKind::Unknown(kind) => {
                    error!(order_id = %event.order_id, change_kind = %kind, "Dropping event with unknown change kind");
                    report.unknown += 1;
                }
            }
        }

        for order_id in &to_resolve {
            self.relay_order(order_id, &mut report).await;
        }

        if report.order_service_unreachable() {
            warn!(
                failures = report.lookup_failures,
                "Order service unreachable, batch will be redelivered"
            );
            if let Err(e) = self.batches.rewind() {
                error!(error = %e, "Failed to rewind change batch");
            }
        } else {
            match self.batches.commit_last() {
                Ok(()) => report.committed = true,
                Err(e) => error!(error = %e, "Failed to commit change batch"),
            }
        }

        if report.read > 0 {
            info!(
                read = report.read,
                published = report.published,
                deleted = report.deleted,
                committed = report.committed,
                "Relayed change batch"
            );
        }

        Ok(report)
    }

    async fn relay_order(&self, order_id: &str, report: &mut RelayReport) {
        let document = match self.lookup.resolve(order_id).await {
            Ok(document) => document,
            Err(e) if e.is_not_found() => {
                warn!(order_id = %order_id, "Order no longer exists, nothing to publish");
                report.not_found += 1;
                return;
            }
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Failed to resolve order");
                report.lookup_failures += 1;
                if e.is_transport() {
                    report.unreachable += 1;
                }
                return;
            }
        };
        report.resolved += 1;

        let payload = match serde_json::to_vec(&document) {
            Ok(payload) => payload,
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Failed to encode order document");
                report.publish_failures += 1;
                return;
            }
        };

        match self.publisher.publish(&document.id, payload).await {
            Ok(()) => report.published += 1,
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Failed to publish order document");
                report.publish_failures += 1;
            }
        }
    }
}

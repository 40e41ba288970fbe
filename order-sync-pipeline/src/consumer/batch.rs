//! Bounded batch reads with batch-granular acknowledgement.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::consumer::{ConsumedMessage, MessageConsumer, MessagePosition};
use crate::errors::{ConsumerError, PipelineError};

/// When a batch read stops.
///
/// A read ends at whichever comes first: `max_messages` messages were read,
/// `batch_interval` elapsed since the read began, or more than
/// `max_timeouts` consecutive polls came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// How long a single poll waits for a message.
    pub poll_timeout: Duration,
    pub batch_interval: Duration,
    pub max_messages: usize,
    pub max_timeouts: u32,
}

impl BatchPolicy {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_messages == 0 {
            return Err(PipelineError::InvalidPolicy(
                "max_messages must be at least 1".to_string(),
            ));
        }
        if self.poll_timeout.is_zero() {
            return Err(PipelineError::InvalidPolicy(
                "poll_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(5),
            batch_interval: Duration::from_secs(1),
            max_messages: 2,
            max_timeouts: 10,
        }
    }
}

/// First and last offsets read from one partition since the last commit.
#[derive(Debug, Clone, Copy)]
struct Span {
    first: i64,
    last: i64,
    /// A rewind to `first` has not gone through yet.
    unrewound: bool,
}

/// Wraps a [`MessageConsumer`] with bounded batch reads.
///
/// Messages are never acknowledged one by one. After processing a batch the
/// caller either commits the last read position of every partition touched
/// since the previous commit, or rewinds to the first one so the whole span
/// is delivered again.
pub struct BatchConsumer<C> {
    consumer: C,
    policy: BatchPolicy,
    pending: BTreeMap<(String, i32), Span>,
}

impl<C: MessageConsumer> BatchConsumer<C> {
    pub fn new(consumer: C, policy: BatchPolicy) -> Result<Self, PipelineError> {
        policy.validate()?;
        Ok(Self {
            consumer,
            policy,
            pending: BTreeMap::new(),
        })
    }

    pub fn subscribe(&self) -> Result<(), ConsumerError> {
        self.consumer.subscribe()
    }

    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    /// Read one batch.
    ///
    /// An empty batch is not an error. A read error abandons the batch; the
    /// messages read before it are still tracked so [`rewind`](Self::rewind)
    /// delivers them again. Partitions whose last rewind failed are sought
    /// again before polling, and the read fails if that still does not work.
    #[instrument(skip(self))]
    pub async fn read_batch(&mut self) -> Result<Vec<ConsumedMessage>, ConsumerError> {
        self.seek_unrewound()?;

        let started = Instant::now();
        let mut messages = Vec::with_capacity(self.policy.max_messages);
        let mut timeouts: u32 = 0;

        loop {
            match self.consumer.poll(self.policy.poll_timeout).await {
                Ok(Some(message)) => {
                    timeouts = 0;
                    self.track(&message.position);
                    messages.push(message);
                    if messages.len() >= self.policy.max_messages {
                        break;
                    }
                }
                Ok(None) => {
                    timeouts += 1;
                    if timeouts > self.policy.max_timeouts {
                        break;
                    }
                }
                Err(e) => return Err(e),
            }

            if started.elapsed() >= self.policy.batch_interval {
                break;
            }
        }

        debug!(count = messages.len(), timeouts = timeouts, "Read batch");
        Ok(messages)
    }

    /// Acknowledge everything read since the previous commit or rewind.
    ///
    /// Does nothing when nothing was read. A partition still waiting for a
    /// failed rewind is never committed.
    pub fn commit_last(&mut self) -> Result<(), ConsumerError> {
        let positions: Vec<MessagePosition> = self
            .pending
            .iter()
            .filter(|(_, span)| !span.unrewound)
            .map(|((topic, partition), span)| MessagePosition::new(topic.clone(), *partition, span.last))
            .collect();

        if positions.is_empty() {
            return Ok(());
        }

        self.consumer.commit(&positions)?;
        self.pending.retain(|_, span| span.unrewound);
        Ok(())
    }

    /// Seek back to the first position read since the previous commit or
    /// rewind, so those messages are read again.
    ///
    /// A partition whose seek fails keeps its span and is sought again by
    /// the next [`read_batch`](Self::read_batch).
    pub fn rewind(&mut self) -> Result<(), ConsumerError> {
        for span in self.pending.values_mut() {
            span.unrewound = true;
        }
        self.seek_unrewound()
    }

    fn seek_unrewound(&mut self) -> Result<(), ConsumerError> {
        let consumer = &self.consumer;
        let mut result = Ok(());

        self.pending.retain(|(topic, partition), span| {
            if !span.unrewound {
                return true;
            }
            let position = MessagePosition::new(topic.clone(), *partition, span.first);
            match consumer.seek(&position) {
                Ok(()) => false,
                Err(e) => {
                    warn!(
                        topic = %position.topic,
                        partition = position.partition,
                        offset = position.offset,
                        error = %e,
                        "Failed to rewind partition"
                    );
                    result = Err(e);
                    true
                }
            }
        });

        result
    }

    fn track(&mut self, position: &MessagePosition) {
        self.pending
            .entry((position.topic.clone(), position.partition))
            .and_modify(|span| {
                span.first = span.first.min(position.offset);
                span.last = span.last.max(position.offset);
            })
            .or_insert(Span {
                first: position.offset,
                last: position.offset,
                unrewound: false,
            });
    }
}

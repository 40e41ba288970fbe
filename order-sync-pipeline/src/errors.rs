//! Error types for the order sync pipeline.

use thiserror::Error;

/// Errors raised by a message consumer.
#[derive(Debug, Clone, Error)]
pub enum ConsumerError {
    /// Could not create the consumer or attach it to its topics.
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// A read failed for a reason other than an empty queue.
    #[error("Read error: {0}")]
    Read(String),

    /// Acknowledging a position failed.
    #[error("Commit error: {0}")]
    Commit(String),

    /// Rewinding to an earlier position failed.
    #[error("Seek error: {0}")]
    Seek(String),
}

impl ConsumerError {
    pub fn subscription(msg: impl Into<String>) -> Self {
        Self::Subscription(msg.into())
    }

    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    pub fn commit(msg: impl Into<String>) -> Self {
        Self::Commit(msg.into())
    }

    pub fn seek(msg: impl Into<String>) -> Self {
        Self::Seek(msg.into())
    }
}

/// Errors raised when publishing a document.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The producer could not be created.
    #[error("Producer configuration error: {0}")]
    Config(String),

    /// The document could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The message was rejected before it reached the producer queue.
    #[error("Enqueue error: {0}")]
    Enqueue(String),
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Conditions that end a pipeline worker, and with it the process.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A worker could not attach to its topic.
    #[error("Subscription failed for {worker}: {source}")]
    Subscription {
        worker: String,
        #[source]
        source: ConsumerError,
    },

    /// A worker returned although it is expected to run forever.
    #[error("Worker {0} exited")]
    WorkerExited(String),

    /// A worker panicked.
    #[error("Worker {0} panicked")]
    WorkerPanicked(String),

    /// Batch policy values that cannot produce a batch.
    #[error("Invalid batch policy: {0}")]
    InvalidPolicy(String),

    #[error(transparent)]
    Consumer(#[from] ConsumerError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl PipelineError {
    pub fn subscription(worker: impl Into<String>, source: ConsumerError) -> Self {
        Self::Subscription {
            worker: worker.into(),
            source,
        }
    }
}

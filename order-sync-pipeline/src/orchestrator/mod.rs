//! Orchestrator module for the order sync pipeline.
//!
//! Runs the long-lived workers concurrently and ends on the first fatal
//! condition from any of them.

use std::future::Future;

use futures::future::{select_all, BoxFuture, FutureExt};
use tokio::task::JoinError;
use tracing::{error, info, instrument};

use crate::consumer::MessageConsumer;
use crate::errors::PipelineError;
use crate::indexer::IndexWriter;
use crate::relay::ChangeRelay;

struct Worker {
    name: String,
    task: BoxFuture<'static, Result<(), PipelineError>>,
}

/// Supervisor for the pipeline workers.
///
/// Workers are expected to run forever. The first one that returns, fails
/// or panics stops the others and becomes the supervisor's result. Crashed
/// workers are not restarted; that is left to the process manager.
#[derive(Default)]
pub struct SyncSupervisor {
    workers: Vec<Worker>,
}

impl SyncSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supervisor for the change relay and the index writer.
    pub fn for_pipeline<R, W>(relay: ChangeRelay<R>, writer: IndexWriter<W>) -> Self
    where
        R: MessageConsumer + 'static,
        W: MessageConsumer + 'static,
    {
        Self::new()
            .with_worker("change-relay", relay.run())
            .with_worker("index-writer", writer.run())
    }

    pub fn with_worker<F>(mut self, name: impl Into<String>, task: F) -> Self
    where
        F: Future<Output = Result<(), PipelineError>> + Send + 'static,
    {
        self.workers.push(Worker {
            name: name.into(),
            task: task.boxed(),
        });
        self
    }

    /// Run every worker until one of them stops or Ctrl-C is received.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - On Ctrl-C, or when there is nothing to run
    /// * `Err(PipelineError)` - The first worker failure, exit or panic
    #[instrument(skip(self), fields(workers = self.workers.len()))]
    pub async fn run(self) -> Result<(), PipelineError> {
        if self.workers.is_empty() {
            return Ok(());
        }

        let mut names = Vec::with_capacity(self.workers.len());
        let mut handles = Vec::with_capacity(self.workers.len());
        for worker in self.workers {
            info!(worker = %worker.name, "Starting worker");
            names.push(worker.name);
            handles.push(tokio::spawn(worker.task));
        }
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        let result = tokio::select! {
            (outcome, index, _) = select_all(handles) => {
                let name = &names[index];
                let result = Self::outcome(name, outcome);
                if let Err(e) = &result {
                    error!(worker = %name, error = %e, "Worker stopped, shutting down");
                }
                result
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                Ok(())
            }
        };

        for abort in aborts {
            abort.abort();
        }

        result
    }

    fn outcome(
        name: &str,
        outcome: Result<Result<(), PipelineError>, JoinError>,
    ) -> Result<(), PipelineError> {
        match outcome {
            Ok(Ok(())) => Err(PipelineError::WorkerExited(name.to_string())),
            Ok(Err(e)) => Err(e),
            Err(e) if e.is_panic() => Err(PipelineError::WorkerPanicked(name.to_string())),
            Err(_) => Err(PipelineError::WorkerExited(name.to_string())),
        }
    }
}

//! # Order Sync
//!
//! Main library for the order search index sync.
//!
//! This crate reads the process configuration, wires the pipeline and the
//! generic search endpoints together, and exposes them to the binary.

pub mod api;
pub mod config;

pub use config::{Dependencies, LogFormat, Settings};

use thiserror::Error;

/// Errors that end the process during startup or while running.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] order_sync_pipeline::PipelineError),

    /// Search index error.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] order_sync_repository::SearchIndexError),

    /// The search API server stopped serving.
    #[error("Search API server stopped")]
    ApiServerStopped,

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SyncError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

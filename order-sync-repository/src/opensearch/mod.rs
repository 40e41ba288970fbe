//! OpenSearch implementation of the order index.
//!
//! This module provides a concrete implementation of `OrderIndex`
//! using OpenSearch as the backend.

mod client;
mod index_config;

pub use client::OpenSearchClient;
pub use index_config::IndexConfig;

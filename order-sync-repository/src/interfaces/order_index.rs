//! Order search index trait definition.

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::query::SearchEngineQuery;
use order_sync_shared::{OrderDocument, SearchResponse};

/// Abstracts the search index holding one document per order.
///
/// The order identifier is the document key, so upserts and deletes are
/// idempotent: indexing the same document twice leaves the index as if it
/// had been indexed once, and deleting an absent document succeeds.
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait OrderIndex: Send + Sync {
    /// Insert or overwrite the document keyed by `document.id`.
    ///
    /// The write must be visible to searches issued after this returns.
    async fn upsert(&self, document: &OrderDocument) -> Result<(), SearchIndexError>;

    /// Remove the document keyed by `order_id`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was deleted (or didn't exist)
    /// * `Err(SearchIndexError)` - If the deletion fails
    async fn delete_by_id(&self, order_id: &str) -> Result<(), SearchIndexError>;

    /// Fetch a single document by order identifier.
    async fn get_by_id(&self, order_id: &str) -> Result<Option<OrderDocument>, SearchIndexError>;

    /// Execute a compiled search-engine query and return the `_source` objects.
    async fn search(&self, query: &SearchEngineQuery) -> Result<SearchResponse, SearchIndexError>;

    /// Create the index with its mappings if it does not exist yet.
    ///
    /// This should be called during application startup.
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Check if the search engine is healthy and reachable.
    async fn health_check(&self) -> Result<bool, SearchIndexError>;
}

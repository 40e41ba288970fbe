//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `OrderIndex`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    DeleteParts, GetParts, IndexParts, OpenSearch, SearchParts,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use order_sync_shared::{OrderDocument, SearchResponse};

use crate::errors::SearchIndexError;
use crate::interfaces::OrderIndex;
use crate::opensearch::index_config::IndexConfig;
use crate::query::SearchEngineQuery;

/// OpenSearch client implementation.
///
/// Documents are keyed by order identifier, so indexing the same order
/// twice overwrites the first write.
///
/// # Example
///
/// ```ignore
/// use order_sync_repository::opensearch::{IndexConfig, OpenSearchClient};
/// use order_sync_shared::OrderDocument;
///
/// let client = OpenSearchClient::new("http://localhost:9200", IndexConfig::default()).await?;
/// client.upsert(&OrderDocument::new("O-1", "Shipped")).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index the client reads and writes
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, index = %index_config.name, "Created OpenSearch client");

        Ok(Self {
            client,
            index_config,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_config.name
    }

    fn validate_id(order_id: &str) -> Result<(), SearchIndexError> {
        if order_id.trim().is_empty() {
            return Err(SearchIndexError::validation("order id must not be empty"));
        }
        Ok(())
    }

    /// Extract the `_source` of every hit in a search response body.
    fn parse_hits(body: &Value) -> Result<Vec<Value>, SearchIndexError> {
        let hits = body
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(Value::as_array)
            .ok_or_else(|| SearchIndexError::parse("search response has no hits array"))?;

        Ok(hits
            .iter()
            .filter_map(|hit| hit.get("_source").cloned())
            .collect())
    }
}

#[async_trait]
impl OrderIndex for OpenSearchClient {
    /// Index a document under its order identifier, overwriting any
    /// previous version, and refresh so the write is immediately searchable.
    #[instrument(skip(self, document), fields(order_id = %document.id))]
    async fn upsert(&self, document: &OrderDocument) -> Result<(), SearchIndexError> {
        Self::validate_id(&document.id)?;

        let body = serde_json::to_value(document)?;

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index_config.name, &document.id))
            .refresh(Refresh::True)
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchIndexError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!("Document indexed");
        Ok(())
    }

    /// Delete a document. A missing document counts as deleted.
    #[instrument(skip(self))]
    async fn delete_by_id(&self, order_id: &str) -> Result<(), SearchIndexError> {
        Self::validate_id(order_id)?;

        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index_config.name, order_id))
            .refresh(Refresh::True)
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!("Document deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, order_id: &str) -> Result<Option<OrderDocument>, SearchIndexError> {
        Self::validate_id(order_id)?;

        let response = self
            .client
            .get(GetParts::IndexId(&self.index_config.name, order_id))
            .send()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Get request failed");
            return Err(SearchIndexError::query(format!(
                "Get failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        match body.get("_source") {
            Some(source) => Ok(Some(serde_json::from_value(source.clone())?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, query))]
    async fn search(&self, query: &SearchEngineQuery) -> Result<SearchResponse, SearchIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[self.index_config.name.as_str()]))
            .body(query.body().clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Search request failed");
            return Err(SearchIndexError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let data = Self::parse_hits(&body)?;
        debug!(hits = data.len(), "Search completed");
        Ok(SearchResponse::new(data))
    }

    /// Create the index with its mappings unless it already exists.
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let name = self.index_config.name.as_str();

        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(index = %name, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(self.index_config.index_settings())
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another instance may have created it between the two calls.
            if error_body.contains("resource_already_exists_exception") {
                warn!(index = %name, "Index was created concurrently");
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %name, "Created search index");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let health: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;
        let status = health
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        debug!(cluster_status = %status, "OpenSearch health");
        Ok(status == "green" || status == "yellow")
    }
}

//! Generic filter request translation.
//!
//! [`QueryTranslator`] compiles one [`GenericFilterRequest`] into either a
//! primary-store query or a search-engine query. It performs no I/O and is
//! deterministic: the same request and mapping always yield structurally
//! equal output.

mod document_store;
mod mapping;
mod search_engine;
mod values;

pub use document_store::{DocumentStoreQuery, FindOptions};
pub use mapping::{BackendMapping, FieldMapping};
pub use search_engine::SearchEngineQuery;

use order_sync_shared::GenericFilterRequest;
use tracing::debug;

use crate::errors::TranslateError;

/// Translator holding the vocabularies of both backends.
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    document_store: BackendMapping,
    search_engine: BackendMapping,
}

impl QueryTranslator {
    /// Build a translator from two mappings.
    ///
    /// # Returns
    ///
    /// * `Ok(QueryTranslator)` - If both mappings cover the same fields and operators
    /// * `Err(TranslateError::InconsistentMapping)` - If they diverge
    pub fn new(
        document_store: BackendMapping,
        search_engine: BackendMapping,
    ) -> Result<Self, TranslateError> {
        document_store.ensure_consistent_with(&search_engine)?;
        Ok(Self {
            document_store,
            search_engine,
        })
    }

    pub fn document_store_mapping(&self) -> &BackendMapping {
        &self.document_store
    }

    pub fn search_engine_mapping(&self) -> &BackendMapping {
        &self.search_engine
    }

    /// Compile `request` into a primary-store filter and find options.
    pub fn to_document_store(
        &self,
        request: &GenericFilterRequest,
    ) -> Result<DocumentStoreQuery, TranslateError> {
        let query = document_store::compile(&self.document_store, request)?;
        debug!(filter = %query.filter, "Compiled document store query");
        Ok(query)
    }

    /// Compile `request` into a search-engine query body.
    pub fn to_search_engine(
        &self,
        request: &GenericFilterRequest,
    ) -> Result<SearchEngineQuery, TranslateError> {
        let query = search_engine::compile(&self.search_engine, request)?;
        debug!(body = %query.body(), "Compiled search engine query");
        Ok(query)
    }
}

impl Default for QueryTranslator {
    /// Order document vocabularies; their consistency is covered by the
    /// mapping tests.
    fn default() -> Self {
        Self {
            document_store: BackendMapping::document_store(),
            search_engine: BackendMapping::search_engine(),
        }
    }
}

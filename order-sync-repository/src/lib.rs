//! # Order Sync Repository
//!
//! This crate provides the collaborators the sync pipeline talks to: the
//! search index holding order documents (with an OpenSearch implementation),
//! the HTTP client that resolves an order identifier into its current
//! document, and the pure translator that compiles a generic filter request
//! into a primary-store or search-engine query.

pub mod errors;
pub mod interfaces;
pub mod lookup;
pub mod opensearch;
pub mod query;

pub use errors::{LookupError, SearchIndexError, TranslateError};
pub use interfaces::{OrderIndex, OrderLookup};
pub use lookup::HttpOrderLookup;
pub use opensearch::{IndexConfig, OpenSearchClient};
pub use query::{BackendMapping, DocumentStoreQuery, FindOptions, QueryTranslator, SearchEngineQuery};

//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the order search index.

use serde_json::{json, Value};

/// Name of the order index when none is configured.
pub const DEFAULT_INDEX_NAME: &str = "order_duplicate_v01";

/// Identifies the index the client reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub name: String,
}

impl IndexConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Settings and mappings used when the index has to be created.
    ///
    /// Identifiers and statuses are plain keywords. Address and product
    /// text is analyzed with a `keyword` sub-field for exact matching,
    /// which is what the search-engine query mapping targets.
    pub fn index_settings(&self) -> Value {
        json!({
            "settings": {
                "number_of_shards": 1,
                "number_of_replicas": 1
            },
            "mappings": {
                "properties": {
                    "id": { "type": "keyword" },
                    "userId": { "type": "keyword" },
                    "status": { "type": "keyword" },
                    "address": address_mapping(),
                    "invoiceAddress": address_mapping(),
                    "product": {
                        "properties": {
                            "name": text_with_keyword(),
                            "quantity": { "type": "integer" },
                            "price": { "type": "double" }
                        }
                    },
                    "total": { "type": "double" },
                    "createdAt": { "type": "date" },
                    "updatedAt": { "type": "date" }
                }
            }
        })
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}

fn text_with_keyword() -> Value {
    json!({
        "type": "text",
        "fields": {
            "keyword": { "type": "keyword", "ignore_above": 256 }
        }
    })
}

fn address_mapping() -> Value {
    json!({
        "properties": {
            "address": text_with_keyword(),
            "city": text_with_keyword(),
            "district": text_with_keyword(),
            "type": { "type": "keyword" },
            "default": {
                "properties": {
                    "isDefaultInvoiceAddress": { "type": "boolean" },
                    "isDefaultRegularAddress": { "type": "boolean" }
                }
            }
        }
    })
}

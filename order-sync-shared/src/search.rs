//! Search endpoint response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result list of a generic search.
///
/// `data` is loosely typed because the caller controls the projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub total_item_count: usize,
    pub data: Vec<Value>,
}

impl SearchResponse {
    pub fn new(data: Vec<Value>) -> Self {
        Self {
            total_item_count: data.len(),
            data,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

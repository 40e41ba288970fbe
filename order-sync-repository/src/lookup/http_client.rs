//! Resolves order identifiers against the order service's REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use order_sync_shared::OrderDocument;

use crate::errors::LookupError;
use crate::interfaces::OrderLookup;

/// Timeout applied to each lookup when none is configured.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(20);

/// Order lookup backed by `GET {base_url}/{order_id}`.
#[derive(Debug, Clone)]
pub struct HttpOrderLookup {
    base_url: String,
    client: reqwest::Client,
}

impl HttpOrderLookup {
    /// Create a lookup client for the collection at `base_url`
    /// (e.g. "http://localhost:8011/api/orders").
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn order_url(&self, order_id: &str) -> String {
        format!("{}/{}", self.base_url, order_id)
    }
}

#[async_trait]
impl OrderLookup for HttpOrderLookup {
    #[instrument(skip(self))]
    async fn resolve(&self, order_id: &str) -> Result<OrderDocument, LookupError> {
        let response = self
            .client
            .get(self.order_url(order_id))
            .send()
            .await
            .map_err(|e| LookupError::transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::not_found(order_id));
        }
        if !status.is_success() {
            warn!(status = %status, "Order service returned an error status");
            return Err(LookupError::UnexpectedStatus {
                order_id: order_id.to_string(),
                status: status.as_u16(),
            });
        }

        let document: OrderDocument = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;

        debug!("Resolved order");
        Ok(document)
    }
}

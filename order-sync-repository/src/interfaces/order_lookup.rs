//! Order lookup trait definition.

use async_trait::async_trait;

use crate::errors::LookupError;
use order_sync_shared::OrderDocument;

/// Resolves an order identifier into the current order document.
///
/// Implementations must bound every call with a timeout: the change relay
/// resolves sequentially, so one hanging lookup would stall it.
#[async_trait]
pub trait OrderLookup: Send + Sync {
    async fn resolve(&self, order_id: &str) -> Result<OrderDocument, LookupError>;
}

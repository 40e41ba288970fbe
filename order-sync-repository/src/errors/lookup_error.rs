//! Order lookup error types.

use thiserror::Error;

/// Errors returned when resolving an order identifier into a document.
///
/// "Not found" is kept apart from transport failures so a retry policy can
/// treat them differently.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The order service answered that the order does not exist.
    #[error("Order not found: {order_id}")]
    NotFound { order_id: String },

    /// The request never produced a response (connect, timeout, reset).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The order service answered with a non-success status other than 404.
    #[error("Unexpected status {status} for order {order_id}")]
    UnexpectedStatus { order_id: String, status: u16 },

    /// The response body was not a valid order document.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl LookupError {
    pub fn not_found(order_id: impl Into<String>) -> Self {
        Self::NotFound {
            order_id: order_id.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The order service could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

//! Generic search endpoints over the order index.

pub mod error;
mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use order_sync_repository::{OrderIndex, QueryTranslator};

pub use error::ApiError;

/// Shared state of the search endpoints.
#[derive(Clone)]
pub struct ApiState {
    pub index: Arc<dyn OrderIndex>,
    pub translator: Arc<QueryTranslator>,
}

impl ApiState {
    pub fn new(index: Arc<dyn OrderIndex>, translator: QueryTranslator) -> Self {
        Self {
            index,
            translator: Arc::new(translator),
        }
    }
}

/// Creates the router with all search routes and shared state.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/orders/search", post(routes::search))
        .route("/api/orders/search/translate", post(routes::translate))
        .route("/api/orders/{id}", get(routes::get_order))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

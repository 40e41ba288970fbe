use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use order_sync_repository::DocumentStoreQuery;
use order_sync_shared::{GenericFilterRequest, OrderDocument, SearchResponse};

use crate::api::{ApiError, ApiState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Both compiled forms of one filter request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedQuery {
    pub document_store: DocumentStoreQuery,
    pub search_engine: serde_json::Value,
}

/// GET /health: healthy when the search cluster is.
pub async fn health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    match state.index.health_check().await {
        Ok(true) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Ok(false) => (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse { status: "unavailable" })),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse { status: "unavailable" }))
        }
    }
}

/// POST /api/orders/search
pub async fn search(
    State(state): State<ApiState>,
    Json(request): Json<GenericFilterRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = state.translator.to_search_engine(&request)?;
    let response = state.index.search(&query).await?;
    Ok(Json(response))
}

/// POST /api/orders/search/translate: compile without executing.
pub async fn translate(
    State(state): State<ApiState>,
    Json(request): Json<GenericFilterRequest>,
) -> Result<Json<TranslatedQuery>, ApiError> {
    Ok(Json(TranslatedQuery {
        document_store: state.translator.to_document_store(&request)?,
        search_engine: state.translator.to_search_engine(&request)?.into_body(),
    }))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<OrderDocument>, ApiError> {
    state
        .index
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order {} not found", id)))
}

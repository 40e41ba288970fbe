//! Search endpoints against an in-memory index.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use order_sync::api::{router, ApiState};
use order_sync_repository::{OrderIndex, QueryTranslator, SearchEngineQuery, SearchIndexError};
use order_sync_shared::{OrderDocument, SearchResponse};

#[derive(Default)]
struct InMemoryIndex {
    documents: Mutex<BTreeMap<String, OrderDocument>>,
    last_query: Mutex<Option<Value>>,
    unavailable: bool,
}

impl InMemoryIndex {
    fn with(documents: Vec<OrderDocument>) -> Self {
        Self {
            documents: Mutex::new(documents.into_iter().map(|d| (d.id.clone(), d)).collect()),
            ..Self::default()
        }
    }

    fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl OrderIndex for InMemoryIndex {
    async fn upsert(&self, document: &OrderDocument) -> Result<(), SearchIndexError> {
        self.documents
            .lock()
            .unwrap()
            .insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn delete_by_id(&self, order_id: &str) -> Result<(), SearchIndexError> {
        self.documents.lock().unwrap().remove(order_id);
        Ok(())
    }

    async fn get_by_id(&self, order_id: &str) -> Result<Option<OrderDocument>, SearchIndexError> {
        Ok(self.documents.lock().unwrap().get(order_id).cloned())
    }

    /// Returns every document; the compiled body is kept for inspection.
    async fn search(&self, query: &SearchEngineQuery) -> Result<SearchResponse, SearchIndexError> {
        if self.unavailable {
            return Err(SearchIndexError::query("cluster unavailable"));
        }
        *self.last_query.lock().unwrap() = Some(query.body().clone());
        let data = self
            .documents
            .lock()
            .unwrap()
            .values()
            .map(|d| serde_json::to_value(d).unwrap())
            .collect();
        Ok(SearchResponse::new(data))
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        Ok(!self.unavailable)
    }
}

fn setup(index: Arc<InMemoryIndex>) -> axum::Router {
    router(ApiState::new(index, QueryTranslator::default()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = setup(Arc::new(InMemoryIndex::default()))
        .oneshot(get("/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_health_check_unavailable() {
    let response = setup(Arc::new(InMemoryIndex::unavailable()))
        .oneshot(get("/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_search_compiles_and_executes() {
    let index = Arc::new(InMemoryIndex::with(vec![
        OrderDocument::new("O-1", "Shipped").with_total(24000.0),
        OrderDocument::new("O-2", "Created").with_total(10.0),
    ]));

    let response = setup(index.clone())
        .oneshot(post_json(
            "/api/orders/search",
            json!({
                "exactFilters": { "status": ["Shipped", "Created"] },
                "match": [{ "matchField": "total", "parameter": "gte", "value": 5 }],
                "sort": { "total": -1 },
                "fields": ["status"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["totalItemCount"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let query = index.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(
        query["query"]["bool"]["must"],
        json!([
            { "terms": { "status": ["Shipped", "Created"] } },
            { "range": { "total": { "gte": 5 } } }
        ])
    );
    assert_eq!(query["sort"], json!([{ "total": { "order": "desc" } }]));
    assert_eq!(query["_source"], json!(["status", "id"]));
}

#[tokio::test]
async fn test_search_with_invalid_date_is_bad_request() {
    let response = setup(Arc::new(InMemoryIndex::default()))
        .oneshot(post_json(
            "/api/orders/search",
            json!({ "matchClauses": [{ "field": "createdAt", "operator": "gt", "value": "last week" }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("createdAt"));
}

#[tokio::test]
async fn test_search_index_failure_is_internal_error() {
    let response = setup(Arc::new(InMemoryIndex::unavailable()))
        .oneshot(post_json("/api/orders/search", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_translate_returns_both_backends() {
    let response = setup(Arc::new(InMemoryIndex::default()))
        .oneshot(post_json(
            "/api/orders/search/translate",
            json!({
                "matchClauses": [{ "field": "address.city", "operator": "eq", "value": "Istanbul" }],
                "fields": ["status", "total"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["documentStore"]["filter"],
        json!({ "$and": [{ "address.city": { "$eq": "Istanbul" } }] })
    );
    assert_eq!(body["documentStore"]["options"]["projection"]["_id"], 1);
    assert_eq!(
        body["searchEngine"]["query"]["bool"]["must"][0],
        json!({ "term": { "address.city.keyword": "Istanbul" } })
    );
}

#[tokio::test]
async fn test_get_order() {
    let index = Arc::new(InMemoryIndex::with(vec![OrderDocument::new("O-1", "Shipped").with_total(24000.0)]));

    let response = setup(index).oneshot(get("/api/orders/O-1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], "O-1");
    assert_eq!(body["status"], "Shipped");
    assert_eq!(body["total"], 24000.0);
}

#[tokio::test]
async fn test_get_missing_order_is_not_found() {
    let response = setup(Arc::new(InMemoryIndex::default()))
        .oneshot(get("/api/orders/O-404"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
}

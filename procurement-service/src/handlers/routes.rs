//! Axum routes for catalog resources
//!
//! Each resource is mounted at `/api/{slug}` with `GET`, `POST`, `PUT` and
//! `DELETE` on the same path. Ids and queries travel in the query string,
//! bodies are JSON.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, uri::Authority, HeaderMap},
    routing::get,
    Router,
};
use serde_json::{json, Value};

use super::error::{ApiError, ApiOperation};
use super::response::ApiResponse;
use crate::config::Config;
use crate::repository::RecordStore;
use crate::resource::{
    parse_ids, MutationTarget, RawParams, ReadParams, ResourceEngine, ResourceError,
};

/// Request-independent settings shared by every resource route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub default_per_page: u64,
    /// Absolute base used for links, e.g. `https://erp.example.org`
    pub public_url: Option<String>,
    /// Include `metadata.hints` in error bodies
    pub expose_hints: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            default_per_page: 10,
            public_url: None,
            expose_hints: true,
        }
    }
}

impl ApiSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_per_page: config.resources.default_per_page,
            public_url: config
                .service
                .public_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            expose_hints: !config.is_production(),
        }
    }
}

struct ResourceApi<S> {
    engine: ResourceEngine<S>,
    settings: ApiSettings,
}

type ApiState<S> = State<Arc<ResourceApi<S>>>;
type ApiResult = Result<ApiResponse, ApiError>;

impl<S: RecordStore> ResourceApi<S> {
    fn slug(&self) -> &'static str {
        self.engine.descriptor().slug
    }

    fn raw_params(&self, pairs: &[(String, String)]) -> RawParams {
        RawParams::from_pairs(pairs, self.engine.descriptor())
    }

    /// Absolute collection URL, from `public_url` or the `Host` header
    ///
    /// A `Host` that is not a plain `host[:port]` authority is ignored and
    /// the links stay relative.
    fn collection_url(&self, headers: &HeaderMap) -> String {
        let path = format!("/api/{}", self.slug());
        if let Some(base) = &self.settings.public_url {
            return format!("{}{}", base, path);
        }
        match host_authority(headers) {
            Some(host) => format!("http://{}{}", host, path),
            None => path,
        }
    }

    fn fail(&self, operation: ApiOperation, err: ResourceError) -> ApiError {
        let error = ApiError::from_resource(operation, err).with_resource(self.slug());
        if !self.settings.expose_hints || error.kind.is_server_error() {
            return error;
        }
        let hints = hints_for(error.operation, self.engine.descriptor().collection_key);
        error.with_hints(hints)
    }
}

fn host_authority(headers: &HeaderMap) -> Option<Authority> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    match host.parse::<Authority>() {
        Ok(authority) if !authority.as_str().contains('@') => Some(authority),
        _ => {
            tracing::debug!(host, "Ignoring malformed Host header for page links");
            None
        }
    }
}

fn hints_for(operation: ApiOperation, collection_key: &str) -> Value {
    match operation {
        ApiOperation::Read => json!({
            "id": "Optional. A single id, a comma-separated list, or repeated id[] keys.",
            "page": "Optional. Page number, given together with per_page.",
            "per_page": "Optional. Between 1 and 100, given together with page.",
            "mode": "Optional. 'pagination' (default) or 'selection'.",
            "search": "Optional. Case-insensitive text search."
        }),
        ApiOperation::Create => json!({
            "body": format!(
                "A single object, or {{\"{}\": [objects]}} for bulk insert.",
                collection_key
            )
        }),
        ApiOperation::Update => json!({
            "id": "Required. A single id, a comma-separated list, or repeated id[] keys.",
            "body": format!(
                "A partial object, or {{\"{}\": [objects]}} aligned with the ids.",
                collection_key
            )
        }),
        ApiOperation::Delete => json!({
            "id": "A single id, a comma-separated list, or repeated id[] keys.",
            "query": "A JSON object of exact field matches, e.g. {\"code\":\"PC\"}. Use either id or query."
        }),
    }
}

fn parse_body(body: &Bytes) -> Result<Value, ResourceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ResourceError::validation("Request body is required."));
    }
    serde_json::from_slice(body)
        .map_err(|e| ResourceError::validation(format!("Request body must be valid JSON: {}", e)))
}

async fn read_resource<S: RecordStore + 'static>(
    State(api): ApiState<S>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult {
    let raw = api.raw_params(&pairs);
    let params = ReadParams::parse(&raw, api.settings.default_per_page)
        .map_err(|e| api.fail(ApiOperation::Read, e))?;
    let url = api.collection_url(&headers);

    let outcome = api
        .engine
        .read(&params, &url)
        .await
        .map_err(|e| api.fail(ApiOperation::Read, e))?;

    Ok(ApiResponse::from_read(api.engine.descriptor(), outcome, &url))
}

async fn create_resource<S: RecordStore + 'static>(
    State(api): ApiState<S>,
    body: Bytes,
) -> ApiResult {
    let body = parse_body(&body).map_err(|e| api.fail(ApiOperation::Create, e))?;
    let outcome = api
        .engine
        .create(body)
        .await
        .map_err(|e| api.fail(ApiOperation::Create, e))?;

    Ok(ApiResponse::from_create(api.engine.descriptor(), outcome))
}

async fn update_resource<S: RecordStore + 'static>(
    State(api): ApiState<S>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Bytes,
) -> ApiResult {
    let raw = api.raw_params(&pairs);
    let ids = parse_ids(&raw.id).map_err(|e| api.fail(ApiOperation::Update, e))?;
    let body = parse_body(&body).map_err(|e| api.fail(ApiOperation::Update, e))?;

    let outcome = api
        .engine
        .update(ids, body)
        .await
        .map_err(|e| api.fail(ApiOperation::Update, e))?;

    Ok(ApiResponse::from_update(api.engine.descriptor(), outcome))
}

async fn delete_resource<S: RecordStore + 'static>(
    State(api): ApiState<S>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult {
    let raw = api.raw_params(&pairs);
    let target = MutationTarget::parse(&raw, api.engine.descriptor())
        .map_err(|e| api.fail(ApiOperation::Delete, e))?;

    let outcome = api
        .engine
        .delete(target)
        .await
        .map_err(|e| api.fail(ApiOperation::Delete, e))?;

    Ok(ApiResponse::from_delete(api.engine.descriptor(), outcome))
}

/// Router serving one resource at `/api/{slug}`
///
/// ```rust
/// use procurement_service::catalog;
/// use procurement_service::handlers::{resource_routes, ApiSettings};
/// use procurement_service::repository::MemoryRecordStore;
/// use procurement_service::resource::ResourceEngine;
///
/// let engine = ResourceEngine::new(catalog::item_units(), MemoryRecordStore::new());
/// let router: axum::Router = resource_routes(engine, ApiSettings::default());
/// ```
pub fn resource_routes<S>(engine: ResourceEngine<S>, settings: ApiSettings) -> Router
where
    S: RecordStore + 'static,
{
    let path = format!("/api/{}", engine.descriptor().slug);
    let api = Arc::new(ResourceApi { engine, settings });

    Router::new()
        .route(
            &path,
            get(read_resource::<S>)
                .post(create_resource::<S>)
                .put(update_resource::<S>)
                .delete(delete_resource::<S>),
        )
        .with_state(api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::repository::MemoryRecordStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app_with(store: MemoryRecordStore, settings: ApiSettings) -> Router {
        resource_routes(ResourceEngine::new(catalog::item_units(), store), settings)
    }

    fn app(store: MemoryRecordStore) -> Router {
        app_with(store, ApiSettings::default())
    }

    async fn call(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "erp.local");
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn seed(store: &MemoryRecordStore, count: usize) {
        let units: Vec<Value> = (1..=count)
            .map(|i| json!({"code": format!("U{}", i), "name": format!("Unit {}", i)}))
            .collect();
        let (status, _) = call(
            app(store.clone()),
            "POST",
            "/api/item-units",
            Some(json!({ "item_units": units })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_item_unit_lifecycle() {
        let store = MemoryRecordStore::new();

        let (status, body) = call(
            app(store.clone()),
            "POST",
            "/api/item-units",
            Some(json!({"code": "PC", "name": "Piece"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Successfully created item unit record.");
        assert_eq!(body["data"]["id"], 1);
        assert_eq!(body["metadata"]["methods"], "[GET, POST, PUT, DELETE]");

        let (status, body) = call(
            app(store.clone()),
            "PUT",
            "/api/item-units?id=1",
            Some(json!({"description": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["description"], "x");
        assert_eq!(body["data"]["name"], "Piece");
        assert_eq!(body["data"]["code"], "PC");

        let (status, body) = call(app(store.clone()), "DELETE", "/api/item-units?id=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted_ids"], json!([1]));

        let (status, body) = call(app(store.clone()), "GET", "/api/item-units?id=1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["kind"], "not_found");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_paginated_read_links() {
        let store = MemoryRecordStore::new();
        seed(&store, 12).await;

        let (status, body) = call(
            app(store),
            "GET",
            "/api/item-units?page=2&per_page=5",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"][0]["id"], 6);
        assert_eq!(body["meta"]["total"], 12);
        assert_eq!(body["meta"]["last_page"], 3);
        assert_eq!(body["meta"]["path"], "http://erp.local/api/item-units");
        assert_eq!(
            body["links"]["next"],
            "http://erp.local/api/item-units?page=3&per_page=5"
        );
    }

    #[tokio::test]
    async fn test_public_url_overrides_host() {
        let store = MemoryRecordStore::new();
        seed(&store, 1).await;
        let settings = ApiSettings {
            public_url: Some("https://erp.example.org".to_string()),
            ..ApiSettings::default()
        };

        let (_, body) = call(app_with(store, settings), "GET", "/api/item-units", None).await;
        assert_eq!(body["meta"]["path"], "https://erp.example.org/api/item-units");
    }

    #[tokio::test]
    async fn test_malformed_host_keeps_links_relative() {
        let store = MemoryRecordStore::new();
        seed(&store, 3).await;

        for host in ["evil.example/phish?x=", "user@evil.example", "bad host"] {
            let request = Request::builder()
                .uri("/api/item-units?page=1&per_page=2")
                .header(header::HOST, host)
                .body(Body::empty())
                .unwrap();
            let response = app(store.clone()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["meta"]["path"], "/api/item-units", "{}", host);
            assert_eq!(
                body["links"]["next"],
                "/api/item-units?page=2&per_page=2",
                "{}",
                host
            );
        }
    }

    #[tokio::test]
    async fn test_equivalent_id_forms() {
        let store = MemoryRecordStore::new();
        seed(&store, 4).await;

        for uri in [
            "/api/item-units?id=1,3&mode=selection",
            "/api/item-units?id%5B%5D=1&id%5B%5D=3&mode=selection",
            "/api/item-units?id=1&id=3&mode=selection",
        ] {
            let (status, body) = call(app(store.clone()), "GET", uri, None).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            let ids: Vec<i64> = body["data"]
                .as_array()
                .unwrap()
                .iter()
                .map(|r| r["id"].as_i64().unwrap())
                .collect();
            assert_eq!(ids, vec![1, 3], "{}", uri);
            assert_eq!(body["metadata"]["mode"], "selection");
        }
    }

    #[tokio::test]
    async fn test_per_page_out_of_range() {
        let (status, body) = call(
            app(MemoryRecordStore::new()),
            "GET",
            "/api/item-units?page=1&per_page=101",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["metadata"]["hints"]["per_page"].is_string());
    }

    #[tokio::test]
    async fn test_hints_hidden_in_production() {
        let settings = ApiSettings {
            expose_hints: false,
            ..ApiSettings::default()
        };
        let (status, body) = call(
            app_with(MemoryRecordStore::new(), settings),
            "DELETE",
            "/api/item-units",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["metadata"].get("hints").is_none());
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let (status, body) = call(
            app(MemoryRecordStore::new()),
            "GET",
            "/api/item-units?id=abc",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_bulk_create_reports_duplicates() {
        let store = MemoryRecordStore::new();
        let (status, body) = call(
            app(store.clone()),
            "POST",
            "/api/item-units",
            Some(json!({"item_units": [
                {"code": "PC", "name": "Piece"},
                {"code": "PC", "name": "Piece again"},
                {"name": "No code"},
                {"code": "BX", "name": "Box"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        let skipped = body["metadata"]["duplicate_items"].as_array().unwrap();
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0]["index"], 1);
        assert_eq!(skipped[1]["index"], 2);
    }

    #[tokio::test]
    async fn test_update_without_id() {
        let (status, body) = call(
            app(MemoryRecordStore::new()),
            "PUT",
            "/api/item-units",
            Some(json!({"name": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "The id parameter is required.");
    }

    #[tokio::test]
    async fn test_partial_bulk_update() {
        let store = MemoryRecordStore::new();
        seed(&store, 2).await;

        let (status, body) = call(
            app(store),
            "PUT",
            "/api/item-units?id=1,9",
            Some(json!({"item_units": [{"name": "One"}, {"name": "Nine"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::MULTI_STATUS);
        assert_eq!(body["data"][0]["name"], "One");
        assert_eq!(body["errors"][0]["id"], 9);
    }

    #[tokio::test]
    async fn test_count_mismatch_mutates_nothing() {
        let store = MemoryRecordStore::new();
        seed(&store, 2).await;

        let (status, body) = call(
            app(store.clone()),
            "PUT",
            "/api/item-units?id=1,2",
            Some(json!({"item_units": [{"name": "Only one"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["kind"], "count_mismatch");

        let (_, body) = call(app(store), "GET", "/api/item-units?id=1", None).await;
        assert_eq!(body["data"]["name"], "Unit 1");
    }

    #[tokio::test]
    async fn test_delete_by_query() {
        let store = MemoryRecordStore::new();
        seed(&store, 2).await;

        let (status, body) = call(
            app(store.clone()),
            "DELETE",
            "/api/item-units?query=%7B%22code%22%3A%22U2%22%7D",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted_id"], 2);
        assert_eq!(body["name"], "Unit 2");
        assert_eq!(body["remaining_active"], 1);

        let (status, _) = call(
            app(store),
            "DELETE",
            "/api/item-units?query=%7B%22code%22%3A%22U2%22%7D",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ambiguous_delete_by_query() {
        let store = MemoryRecordStore::new();
        let (status, _) = call(
            app(store.clone()),
            "POST",
            "/api/item-units",
            Some(json!({"item_units": [
                {"code": "A", "name": "Same"},
                {"code": "B", "name": "Same"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            app(store.clone()),
            "DELETE",
            "/api/item-units?query=%7B%22name%22%3A%22Same%22%7D",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["metadata"]["candidates"].as_array().unwrap().len(), 2);

        let (_, body) = call(app(store), "GET", "/api/item-units", None).await;
        assert_eq!(body["meta"]["total"], 2);
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/item-units")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app(MemoryRecordStore::new()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

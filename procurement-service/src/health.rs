//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{repository::RecordStore, state::AppState};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response with per-resource storage status
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,

    /// Storage status keyed by resource slug
    pub dependencies: BTreeMap<String, DependencyStatus>,
}

/// Individual dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Dependency is healthy
    pub healthy: bool,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Simple health check (liveness probe)
///
/// Always returns 200 OK if the service is running.
pub async fn health<S: RecordStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check (readiness probe)
///
/// Counts the active records of every resource concurrently. Returns 503 Service
/// Unavailable if any store fails to answer.
pub async fn readiness<S: RecordStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let mut dependencies = BTreeMap::new();
    let mut all_ready = true;

    let probes = state.resources().iter().map(|engine| async move {
        (engine.descriptor().slug, engine.count_active().await)
    });

    for (slug, result) in join_all(probes).await {
        let status = match result {
            Ok(count) => DependencyStatus {
                healthy: true,
                message: Some(format!("{} active record(s)", count)),
            },
            Err(e) => {
                tracing::error!(resource = slug, "Storage health check failed: {}", e);
                all_ready = false;
                DependencyStatus {
                    healthy: false,
                    message: Some("Storage unavailable".to_string()),
                }
            }
        };
        dependencies.insert(slug.to_string(), status);
    }

    let response = ReadinessResponse {
        ready: all_ready,
        service: state.config().service.name.clone(),
        dependencies,
    };

    let status = if all_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// `/health` and `/ready`
pub fn health_routes<S: RecordStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::<S>))
        .route("/ready", get(readiness::<S>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::config::Config;
    use crate::repository::{
        Filter, MemoryRecordStore, OrderDirection, Pagination, Record, RepositoryError,
        RepositoryOperation, RepositoryResult,
    };
    use crate::resource::ResourceEngine;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Map, Value};
    use tower::ServiceExt;

    /// Store whose backend is always down
    #[derive(Clone)]
    struct DownStore;

    fn down<T>(operation: RepositoryOperation) -> RepositoryResult<T> {
        Err(RepositoryError::connection_failed(operation, "connection refused"))
    }

    impl RecordStore for DownStore {
        async fn find_active(
            &self,
            _filters: &[Filter],
            _order_by: Option<(&str, OrderDirection)>,
            _pagination: Option<Pagination>,
        ) -> RepositoryResult<Vec<Record>> {
            down(RepositoryOperation::FindActive)
        }

        async fn count_active(&self, _filters: &[Filter]) -> RepositoryResult<u64> {
            down(RepositoryOperation::Count)
        }

        async fn find_active_by_id(&self, _id: i64) -> RepositoryResult<Option<Record>> {
            down(RepositoryOperation::FindActive)
        }

        async fn insert(&self, _fields: Map<String, Value>) -> RepositoryResult<Record> {
            down(RepositoryOperation::Insert)
        }

        async fn update(
            &self,
            _id: i64,
            _fields: Map<String, Value>,
        ) -> RepositoryResult<Option<Record>> {
            down(RepositoryOperation::Update)
        }

        async fn soft_delete(&self, _id: i64) -> RepositoryResult<bool> {
            down(RepositoryOperation::SoftDelete)
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let state = AppState::new(
            Config::default(),
            vec![ResourceEngine::new(catalog::item_units(), MemoryRecordStore::new())],
        );
        let app = health_routes(state);

        let (status, body) = get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = get_json(app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
        assert_eq!(body["dependencies"]["item-units"]["healthy"], true);
    }

    #[tokio::test]
    async fn test_ready_reports_storage_failure() {
        let state = AppState::new(
            Config::default(),
            vec![ResourceEngine::new(catalog::item_units(), DownStore)],
        );
        let app = health_routes(state);

        let (status, _) = get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get_json(app, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
        assert_eq!(body["dependencies"]["item-units"]["healthy"], false);
    }
}

//! UMIS client
//!
//! Read-only access to the organization data (areas, designations, users)
//! held by UMIS. Every call is a `GET` that logs its outcome and yields
//! `None` on any failure; callers decide what a missing answer means.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;

use crate::config::UmisConfig;
use crate::error::{Error, Result};

const API_KEY_HEADER: &str = "umis-api-key";
const SYSTEM_HEADER: &str = "x-erp-system";

/// Keep the first five characters of a secret for log correlation
fn mask_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    Some(format!("{}...", key.chars().take(5).collect::<String>()))
}

/// HTTP client for the UMIS API
#[derive(Debug, Clone)]
pub struct UmisClient {
    client: reqwest::Client,
    base_url: String,
    masked_key: Option<String>,
}

impl UmisClient {
    pub fn new(config: &UmisConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| Error::Internal(format!("Invalid UMIS api key: {}", e)))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(
            SYSTEM_HEADER,
            HeaderValue::from_str(&config.system_name)
                .map_err(|e| Error::Internal(format!("Invalid UMIS system name: {}", e)))?,
        );

        if config.accept_invalid_certs {
            tracing::warn!("UMIS client accepts invalid TLS certificates");
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create UMIS HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            masked_key: mask_key(&config.api_key),
        })
    }

    /// `GET {base_url}/{path}` and decode the JSON body
    pub async fn fetch(&self, path: &str) -> Option<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        tracing::info!(
            url = %url,
            has_api_key = self.masked_key.is_some(),
            api_key = ?self.masked_key,
            "Attempting to connect to UMIS API"
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "UMIS API request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                url = %url,
                status = status.as_u16(),
                response = %body,
                "UMIS API returned an error status"
            );
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => {
                tracing::info!(url = %url, "UMIS API request succeeded");
                Some(value)
            }
            Err(e) => {
                tracing::error!(url = %url, error = %e, "UMIS API returned invalid JSON");
                None
            }
        }
    }

    pub async fn areas(&self) -> Option<Value> {
        self.fetch("erp-data-areas").await
    }

    pub async fn area(&self, area_id: i64) -> Option<Value> {
        self.fetch(&format!("assign-area/{}", area_id)).await
    }

    /// The area tree; UMIS serves it from the areas endpoint
    pub async fn organization_structure(&self) -> Option<Value> {
        self.fetch("erp-data-areas").await
    }

    pub async fn designations(&self) -> Option<Value> {
        self.fetch("erp-data-designations").await
    }

    pub async fn users(&self) -> Option<Value> {
        self.fetch("erp-data-users").await
    }

    pub async fn assigned_areas(&self) -> Option<Value> {
        self.fetch("erp-data-assigned-areas").await
    }
}

type UmisState = State<Arc<UmisClient>>;

fn relay(what: &str, value: Option<Value>) -> Result<Json<Value>> {
    value
        .map(Json)
        .ok_or_else(|| Error::External(format!("UMIS {} unavailable", what)))
}

async fn get_areas(State(client): UmisState) -> Result<Json<Value>> {
    relay("areas", client.areas().await)
}

async fn get_area(State(client): UmisState, Path(area_id): Path<i64>) -> Result<Json<Value>> {
    relay("area", client.area(area_id).await)
}

async fn get_organization_structure(State(client): UmisState) -> Result<Json<Value>> {
    relay("organization structure", client.organization_structure().await)
}

async fn get_designations(State(client): UmisState) -> Result<Json<Value>> {
    relay("designations", client.designations().await)
}

async fn get_users(State(client): UmisState) -> Result<Json<Value>> {
    relay("users", client.users().await)
}

async fn get_assigned_areas(State(client): UmisState) -> Result<Json<Value>> {
    relay("assigned areas", client.assigned_areas().await)
}

/// Read-only proxy routes under `/api/umis`
pub fn umis_routes(client: UmisClient) -> Router {
    Router::new()
        .route("/api/umis/areas", get(get_areas))
        .route("/api/umis/areas/{id}", get(get_area))
        .route(
            "/api/umis/organization-structure",
            get(get_organization_structure),
        )
        .route("/api/umis/designations", get(get_designations))
        .route("/api/umis/users", get(get_users))
        .route("/api/umis/assigned-areas", get(get_assigned_areas))
        .with_state(Arc::new(client))
}

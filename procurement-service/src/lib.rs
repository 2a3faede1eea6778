//! # procurement-service
//!
//! Generic CRUD backend for the reference data of an ERP procurement
//! module: item units, purchase types, items, objectives and the like.
//!
//! ## Features
//!
//! - **One engine, many resources**: every resource is a
//!   [`ResourceDescriptor`](resource::ResourceDescriptor) served by the same
//!   [`ResourceEngine`](resource::ResourceEngine)
//! - **Bulk mutations**: per-record success and failure, never an all-or-nothing batch
//! - **Soft delete**: records are stamped, never removed
//! - **Pagination and selection**: page links with a sliding window, or a flat
//!   projection for select components
//! - **Storage**: in-memory by default, PostgreSQL with the `database` feature
//! - **UMIS proxy**: read-only organization data from the UMIS API
//! - **Health checks**: liveness and readiness probes
//! - **Graceful shutdown**: proper signal handling (SIGTERM, SIGINT)
//!
//! ## Example
//!
//! ```rust,no_run
//! use procurement_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     ServiceBuilder::new(config)
//!         .with_catalog(|_| MemoryRecordStore::new())
//!         .build()?
//!         .serve()
//!         .await
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod observability;
pub mod repository;
pub mod resource;
pub mod server;
pub mod service_builder;
pub mod state;
pub mod umis;

#[cfg(feature = "database")]
pub mod database;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, UmisConfig};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{resource_routes, ApiError, ApiResponse, ApiSettings};
    pub use crate::health::{health, health_routes, readiness};
    pub use crate::middleware::{
        request_id_layer, request_id_propagation_layer, sensitive_headers_layer,
        SENSITIVE_HEADERS,
    };
    pub use crate::observability::init_tracing;
    pub use crate::repository::{MemoryRecordStore, Record, RecordStore, RepositoryError};
    pub use crate::resource::{
        CreateOutcome, DeleteOutcome, MutationTarget, ReadOutcome, ReadParams, ResourceDescriptor,
        ResourceEngine, ResourceError, UpdateOutcome,
    };
    pub use crate::server::Server;
    pub use crate::service_builder::{ProcurementService, ServiceBuilder};
    pub use crate::state::AppState;
    pub use crate::umis::{umis_routes, UmisClient};

    #[cfg(feature = "database")]
    pub use crate::database::create_pool;
    #[cfg(feature = "database")]
    pub use crate::repository::PgRecordStore;

    pub use axum::{
        extract::{Path, Query, State},
        routing::{delete, get, post, put},
        Json, Router,
    };
    pub use serde::{Deserialize, Serialize};
    pub use tokio;
    pub use tracing::{debug, error, info, warn};
}

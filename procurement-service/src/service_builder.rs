//! Service assembly
//!
//! [`ServiceBuilder`] collects the configuration, the resource engines and
//! the optional UMIS client, and produces a [`ProcurementService`] whose
//! router always carries `/health` and `/ready`.
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
//!     let service = ServiceBuilder::new(config)
//!         .with_catalog(|_| MemoryRecordStore::new())
//!         .build()?;
//!
//!     service.serve().await
//! }
//! ```

use axum::Router;

use crate::{
    catalog,
    config::Config,
    error::Result,
    handlers::{resource_routes, ApiSettings},
    health::health_routes,
    repository::RecordStore,
    resource::{ResourceDescriptor, ResourceEngine},
    server::Server,
    state::AppState,
    umis::{umis_routes, UmisClient},
};

/// Builder for the HTTP service
pub struct ServiceBuilder<S> {
    config: Config,
    resources: Vec<ResourceEngine<S>>,
    umis: Option<UmisClient>,
}

impl<S: RecordStore + Clone + 'static> ServiceBuilder<S> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            resources: Vec::new(),
            umis: None,
        }
    }

    /// Mount one resource
    pub fn with_resource(mut self, engine: ResourceEngine<S>) -> Self {
        self.resources.push(engine);
        self
    }

    /// Mount every catalog resource enabled in `resources.enabled`
    ///
    /// `store_for` is called once per resource.
    pub fn with_catalog<F>(mut self, mut store_for: F) -> Self
    where
        F: FnMut(&ResourceDescriptor) -> S,
    {
        for descriptor in catalog::enabled(&self.config.resources.enabled) {
            let store = store_for(&descriptor);
            self.resources.push(ResourceEngine::new(descriptor, store));
        }
        self
    }

    /// Use an explicit UMIS client instead of the configured one
    pub fn with_umis(mut self, client: UmisClient) -> Self {
        self.umis = Some(client);
        self
    }

    /// Build the service
    ///
    /// UMIS routes are mounted when a client was given or `umis` is
    /// configured.
    pub fn build(self) -> Result<ProcurementService> {
        let settings = ApiSettings::from_config(&self.config);

        let umis = match (self.umis, &self.config.umis) {
            (Some(client), _) => Some(client),
            (None, Some(umis_config)) => Some(UmisClient::new(umis_config)?),
            (None, None) => None,
        };

        let mut app = Router::new();
        for engine in &self.resources {
            tracing::info!(
                resource = engine.descriptor().slug,
                "Mounting /api/{}",
                engine.descriptor().slug
            );
            app = app.merge(resource_routes(engine.clone(), settings.clone()));
        }

        match umis {
            Some(client) => {
                tracing::info!("Mounting UMIS routes under /api/umis");
                app = app.merge(umis_routes(client));
            }
            None => tracing::info!("UMIS not configured, /api/umis routes disabled"),
        }

        let state = AppState::new(self.config.clone(), self.resources);
        app = app.merge(health_routes(state));

        Ok(ProcurementService {
            config: self.config,
            app,
        })
    }
}

/// Assembled service, ready to serve
pub struct ProcurementService {
    config: Config,
    app: Router,
}

impl ProcurementService {
    /// Router with every route and the full middleware stack
    pub fn router(&self) -> Router {
        Server::new(self.config.clone()).layered(self.app.clone())
    }

    /// Serve until SIGINT or SIGTERM
    pub async fn serve(self) -> Result<()> {
        Server::new(self.config).serve(self.app).await
    }

    /// Get a reference to the service configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

//! HTTP handlers for catalog resources
//!
//! [`resource_routes`] mounts a [`ResourceEngine`](crate::resource::ResourceEngine)
//! at `/api/{slug}`. Engine outcomes become [`ApiResponse`] envelopes and
//! engine failures become [`ApiError`] responses with the matching status.
//!
//! # Integration with Axum
//!
//! ```rust,ignore
//! use procurement_service::handlers::{resource_routes, ApiSettings};
//!
//! let settings = ApiSettings::from_config(&config);
//! let app = catalog::all()
//!     .into_iter()
//!     .fold(Router::new(), |router, descriptor| {
//!         let engine = ResourceEngine::new(descriptor, MemoryRecordStore::new());
//!         router.merge(resource_routes(engine, settings.clone()))
//!     });
//! ```

mod error;
mod response;
mod routes;

pub use error::{ApiError, ApiErrorKind, ApiOperation};
pub use response::{ApiResponse, METHODS};
pub use routes::{resource_routes, ApiSettings};

//! Generic bulk resource manager
//!
//! Every CRUD resource of the service is a [`ResourceDescriptor`] plus a
//! [`ResourceEngine`] over some [`RecordStore`](crate::repository::RecordStore).
//!
//! ```rust
//! use procurement_service::catalog;
//! use procurement_service::repository::MemoryRecordStore;
//! use procurement_service::resource::{CreateOutcome, ResourceEngine};
//! use serde_json::json;
//!
//! # tokio_test_block(async {
//! let engine = ResourceEngine::new(catalog::item_units(), MemoryRecordStore::new());
//! let created = engine.create(json!({"code": "PC", "name": "Piece"})).await.unwrap();
//! assert_eq!(created.created_count(), 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod descriptor;
mod engine;
mod error;
mod ids;
mod outcome;
mod pagination;
mod resolver;

pub use descriptor::{FieldKind, FieldSpec, ResourceDescriptor};
pub use engine::ResourceEngine;
pub use error::{ResourceError, ResourceResult};
pub use ids::parse_ids;
pub use outcome::{
    CreateOutcome, DeleteOutcome, ItemError, ReadOutcome, SkippedItem, UpdateOutcome, UpdateStatus,
};
pub use pagination::{page_window, Mode, Page, PageLink, PageLinks, PageMeta, PageRequest, PageUrls, MAX_PER_PAGE};
pub use resolver::{parse_query_object, search_filter, MutationTarget, RawParams, ReadParams};

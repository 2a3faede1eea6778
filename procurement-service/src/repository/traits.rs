//! Record store trait
//!
//! The store is the only collaborator the resource engine talks to. Methods
//! use RPITIT (`impl Future` in trait position) so implementations can be
//! written with plain `async fn`.

use std::future::Future;

use serde_json::{Map, Value};

use super::error::RepositoryError;
use super::filter::{Filter, OrderDirection, Pagination};
use super::record::Record;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Storage for one resource table with soft-delete semantics
///
/// Every read method only sees active records (`deleted_at` is null).
/// `created_at`, `updated_at` and `deleted_at` are stamped by the store.
pub trait RecordStore: Send + Sync {
    /// Active records matching every filter
    fn find_active(
        &self,
        filters: &[Filter],
        order_by: Option<(&str, OrderDirection)>,
        pagination: Option<Pagination>,
    ) -> impl Future<Output = RepositoryResult<Vec<Record>>> + Send;

    /// Number of active records matching every filter
    fn count_active(
        &self,
        filters: &[Filter],
    ) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// One active record by id
    fn find_active_by_id(
        &self,
        id: i64,
    ) -> impl Future<Output = RepositoryResult<Option<Record>>> + Send;

    /// Insert a record and return it with its assigned id
    fn insert(
        &self,
        fields: Map<String, Value>,
    ) -> impl Future<Output = RepositoryResult<Record>> + Send;

    /// Merge `fields` into an active record and refresh `updated_at`
    ///
    /// Returns `Ok(None)` when no active record has this id.
    fn update(
        &self,
        id: i64,
        fields: Map<String, Value>,
    ) -> impl Future<Output = RepositoryResult<Option<Record>>> + Send;

    /// Stamp `deleted_at` on an active record
    ///
    /// Returns `Ok(false)` when no active record has this id.
    fn soft_delete(&self, id: i64) -> impl Future<Output = RepositoryResult<bool>> + Send;
}

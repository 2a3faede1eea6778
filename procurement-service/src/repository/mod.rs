//! Storage collaborator for resource records
//!
//! - [`RecordStore`]: soft-delete aware CRUD over one resource table
//! - [`MemoryRecordStore`]: process-local store, the default backend
//! - `PgRecordStore`: PostgreSQL store (feature `database`)
//! - [`Filter`] / [`FilterCondition`]: predicates for reads and counts
//! - [`Pagination`] / [`OrderDirection`]: result windowing

mod error;
mod filter;
mod memory;
mod record;
mod traits;

#[cfg(feature = "database")]
mod postgres;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use filter::{Filter, FilterCondition, FilterOperator, FilterValue, OrderDirection, Pagination};
pub use memory::MemoryRecordStore;
pub use record::{Record, RESERVED_COLUMNS};
pub use traits::{RecordStore, RepositoryResult};

#[cfg(feature = "database")]
pub use postgres::PgRecordStore;

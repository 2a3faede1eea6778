//! Process-local record store
//!
//! Rows live in a `BTreeMap` keyed by id behind a `tokio::sync::RwLock`, so
//! writers are serialized and ids are handed out monotonically. Nothing is
//! ever physically removed.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::filter::{Filter, OrderDirection, Pagination};
use super::record::{Record, RESERVED_COLUMNS};
use super::traits::{RecordStore, RepositoryResult};

#[derive(Debug)]
struct MemoryTable {
    rows: BTreeMap<i64, Record>,
    next_id: i64,
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// In-memory [`RecordStore`]; clones share the same table
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    table: Arc<RwLock<MemoryTable>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Physical row count, soft-deleted rows included
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }
}

fn strip_reserved(mut fields: Map<String, Value>) -> Map<String, Value> {
    for column in RESERVED_COLUMNS {
        fields.remove(column);
    }
    fields
}

fn compare_by(field: &str, a: &Record, b: &Record) -> Ordering {
    if field == "id" {
        return a.id.cmp(&b.id);
    }
    match (a.fields.get(field), b.fields.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => a.field_text(field).cmp(&b.field_text(field)),
    }
}

fn matches_all(filters: &[Filter], record: &Record) -> bool {
    filters.iter().all(|f| f.matches(record))
}

impl RecordStore for MemoryRecordStore {
    async fn find_active(
        &self,
        filters: &[Filter],
        order_by: Option<(&str, OrderDirection)>,
        pagination: Option<Pagination>,
    ) -> RepositoryResult<Vec<Record>> {
        let table = self.table.read().await;
        let mut rows: Vec<Record> = table
            .rows
            .values()
            .filter(|r| r.is_active() && matches_all(filters, r))
            .cloned()
            .collect();

        if let Some((field, direction)) = order_by {
            rows.sort_by(|a, b| {
                let ordering = compare_by(field, a, b).then(a.id.cmp(&b.id));
                match direction {
                    OrderDirection::Ascending => ordering,
                    OrderDirection::Descending => ordering.reverse(),
                }
            });
        }

        let rows = match pagination {
            Some(page) => rows
                .into_iter()
                .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
                .collect(),
            None => rows,
        };
        Ok(rows)
    }

    async fn count_active(&self, filters: &[Filter]) -> RepositoryResult<u64> {
        let table = self.table.read().await;
        let count = table
            .rows
            .values()
            .filter(|r| r.is_active() && matches_all(filters, r))
            .count();
        Ok(count as u64)
    }

    async fn find_active_by_id(&self, id: i64) -> RepositoryResult<Option<Record>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).filter(|r| r.is_active()).cloned())
    }

    async fn insert(&self, fields: Map<String, Value>) -> RepositoryResult<Record> {
        let mut table = self.table.write().await;
        let id = table.next_id;
        table.next_id += 1;
        let record = Record::new(id, strip_reserved(fields));
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: i64, fields: Map<String, Value>) -> RepositoryResult<Option<Record>> {
        let mut table = self.table.write().await;
        let Some(record) = table.rows.get_mut(&id).filter(|r| r.is_active()) else {
            return Ok(None);
        };
        for (key, value) in strip_reserved(fields) {
            record.fields.insert(key, value);
        }
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn soft_delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&id).filter(|r| r.is_active()) {
            Some(record) => {
                let now = Utc::now();
                record.deleted_at = Some(now);
                record.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

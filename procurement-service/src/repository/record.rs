//! The generic stored record

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{RepositoryError, RepositoryOperation};

/// Columns managed by storage; never accepted from clients
pub const RESERVED_COLUMNS: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

/// One row of any resource table
///
/// Descriptive fields are kept as a JSON object and serialized inline next to
/// the storage-managed columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    /// A fresh active record stamped with the current time
    pub fn new(id: i64, fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id,
            fields,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Field value by name; `id` addresses the primary key
    pub fn get(&self, name: &str) -> Option<Value> {
        if name == "id" {
            return Some(Value::from(self.id));
        }
        self.fields.get(name).cloned()
    }

    /// Textual form of a field for comparisons; `None` when absent or null
    pub fn field_text(&self, name: &str) -> Option<String> {
        if name == "id" {
            return Some(self.id.to_string());
        }
        match self.fields.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Project to `id` plus the named fields (missing fields become null)
    pub fn project(&self, names: &[&str]) -> Value {
        let mut out = Map::new();
        out.insert("id".to_string(), Value::from(self.id));
        for name in names {
            out.insert(
                (*name).to_string(),
                self.fields.get(*name).cloned().unwrap_or(Value::Null),
            );
        }
        Value::Object(out)
    }

    /// Build a record from a row rendered as a JSON object
    ///
    /// Storage-managed columns are lifted out; every other column becomes a
    /// descriptive field.
    pub fn from_row_json(operation: RepositoryOperation, row: Value) -> Result<Self, RepositoryError> {
        let Value::Object(mut fields) = row else {
            return Err(RepositoryError::serialization_error(
                operation,
                "row is not a JSON object",
            ));
        };

        let id = fields
            .remove("id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| RepositoryError::serialization_error(operation, "row has no integer id"))?;
        let created_at = take_timestamp(&mut fields, "created_at", operation)?
            .ok_or_else(|| RepositoryError::serialization_error(operation, "row has no created_at"))?;
        let updated_at = take_timestamp(&mut fields, "updated_at", operation)?.unwrap_or(created_at);
        let deleted_at = take_timestamp(&mut fields, "deleted_at", operation)?;

        Ok(Self {
            id,
            fields,
            created_at,
            updated_at,
            deleted_at,
        })
    }
}

fn take_timestamp(
    fields: &mut Map<String, Value>,
    column: &str,
    operation: RepositoryOperation,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    match fields.remove(column) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value::<DateTime<Utc>>(value)
            .map(Some)
            .map_err(|e| {
                RepositoryError::serialization_error(operation, format!("{}: {}", column, e))
            }),
    }
}

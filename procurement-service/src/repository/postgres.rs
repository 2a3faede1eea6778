//! PostgreSQL record store
//!
//! One table per resource, named after the resource's collection key. Rows
//! are read back as `to_jsonb(t)` so a single decoding path serves every
//! resource. Values are bound as text and cast to the declared column type.

use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::error::{RepositoryError, RepositoryOperation};
use super::filter::{Filter, FilterCondition, FilterOperator, FilterValue, OrderDirection, Pagination};
use super::record::Record;
use super::traits::{RecordStore, RepositoryResult};
use crate::resource::{FieldKind, ResourceDescriptor};

/// PostgreSQL-backed [`RecordStore`] for one resource
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    table: String,
    columns: Vec<(String, FieldKind)>,
}

fn sql_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "TEXT",
        FieldKind::Integer => "BIGINT",
        FieldKind::Number => "NUMERIC",
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn bind_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl PgRecordStore {
    /// Store for the resource described by `descriptor`
    pub fn new(pool: PgPool, descriptor: &ResourceDescriptor) -> Self {
        Self {
            pool,
            table: descriptor.collection_key.to_string(),
            columns: descriptor
                .fields
                .iter()
                .map(|f| (f.name.to_string(), f.kind))
                .collect(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn error(&self, operation: RepositoryOperation, err: sqlx::Error) -> RepositoryError {
        RepositoryError::from_sqlx(operation, err).with_table(&self.table)
    }

    fn column_kind(&self, name: &str) -> Option<FieldKind> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, kind)| *kind)
    }

    fn column(&self, operation: RepositoryOperation, name: &str) -> RepositoryResult<String> {
        if name == "id" || self.column_kind(name).is_some() {
            Ok(format!("t.{}", quote_ident(name)))
        } else {
            Err(RepositoryError::database_error(
                operation,
                format!("unknown column '{}'", name),
            )
            .with_table(&self.table))
        }
    }

    /// Create the backing table when it does not exist yet
    pub async fn ensure_table(&self) -> RepositoryResult<()> {
        let mut ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (id BIGSERIAL PRIMARY KEY",
            quote_ident(&self.table)
        );
        for (name, kind) in &self.columns {
            ddl.push_str(&format!(", {} {} NULL", quote_ident(name), sql_type(*kind)));
        }
        ddl.push_str(
            ", created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
             updated_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
             deleted_at TIMESTAMPTZ NULL)",
        );

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| self.error(RepositoryOperation::EnsureSchema, e))?;
        tracing::debug!(table = %self.table, "Ensured resource table");
        Ok(())
    }

    fn push_condition(
        &self,
        qb: &mut QueryBuilder<'_, Postgres>,
        operation: RepositoryOperation,
        condition: &FilterCondition,
    ) -> RepositoryResult<()> {
        let column = self.column(operation, &condition.field)?;
        match (condition.operator, &condition.value) {
            (FilterOperator::In, FilterValue::IntegerList(ids)) if condition.field == "id" => {
                qb.push(format!("{} = ANY(", column));
                qb.push_bind(ids.clone());
                qb.push(")");
            }
            (FilterOperator::In, FilterValue::IntegerList(ids)) => {
                let texts: Vec<String> = ids.iter().map(ToString::to_string).collect();
                qb.push(format!("{}::text = ANY(", column));
                qb.push_bind(texts);
                qb.push(")");
            }
            (FilterOperator::Contains, value) => match value.as_text() {
                Some(term) => {
                    qb.push(format!("{}::text ILIKE ", column));
                    qb.push_bind(format!("%{}%", escape_like(&term)));
                }
                None => {
                    qb.push("FALSE");
                }
            },
            (_, value) => match value.as_text() {
                Some(text) => {
                    qb.push(format!("{}::text = ", column));
                    qb.push_bind(text);
                }
                None => {
                    qb.push(format!("{} IS NULL", column));
                }
            },
        }
        Ok(())
    }

    fn push_where(
        &self,
        qb: &mut QueryBuilder<'_, Postgres>,
        operation: RepositoryOperation,
        filters: &[Filter],
    ) -> RepositoryResult<()> {
        qb.push(" WHERE t.deleted_at IS NULL");
        for filter in filters {
            qb.push(" AND (");
            match filter {
                Filter::Condition(condition) => self.push_condition(qb, operation, condition)?,
                Filter::AnyOf(conditions) if conditions.is_empty() => {
                    qb.push("FALSE");
                }
                Filter::AnyOf(conditions) => {
                    for (i, condition) in conditions.iter().enumerate() {
                        if i > 0 {
                            qb.push(" OR ");
                        }
                        self.push_condition(qb, operation, condition)?;
                    }
                }
            }
            qb.push(")");
        }
        Ok(())
    }

    fn known_fields(&self, fields: Map<String, Value>) -> Vec<(String, FieldKind, Value)> {
        fields
            .into_iter()
            .filter_map(|(name, value)| self.column_kind(&name).map(|kind| (name, kind, value)))
            .collect()
    }

    fn decode(&self, operation: RepositoryOperation, row: Value) -> RepositoryResult<Record> {
        Record::from_row_json(operation, row).map_err(|e| e.with_table(&self.table))
    }
}

impl RecordStore for PgRecordStore {
    async fn find_active(
        &self,
        filters: &[Filter],
        order_by: Option<(&str, OrderDirection)>,
        pagination: Option<Pagination>,
    ) -> RepositoryResult<Vec<Record>> {
        let op = RepositoryOperation::FindActive;
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT to_jsonb(t) FROM {} t",
            quote_ident(&self.table)
        ));
        self.push_where(&mut qb, op, filters)?;

        if let Some((field, direction)) = order_by {
            let column = self.column(op, field)?;
            let direction = match direction {
                OrderDirection::Ascending => "ASC",
                OrderDirection::Descending => "DESC",
            };
            qb.push(format!(" ORDER BY {} {}, t.id {}", column, direction, direction));
        }
        if let Some(page) = pagination {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(page.limit).unwrap_or(i64::MAX));
            qb.push(" OFFSET ");
            qb.push_bind(i64::try_from(page.offset).unwrap_or(i64::MAX));
        }

        let rows: Vec<Value> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.error(op, e))?;
        rows.into_iter().map(|row| self.decode(op, row)).collect()
    }

    async fn count_active(&self, filters: &[Filter]) -> RepositoryResult<u64> {
        let op = RepositoryOperation::Count;
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM {} t",
            quote_ident(&self.table)
        ));
        self.push_where(&mut qb, op, filters)?;

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.error(op, e))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn find_active_by_id(&self, id: i64) -> RepositoryResult<Option<Record>> {
        let op = RepositoryOperation::FindActive;
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} t WHERE t.id = $1 AND t.deleted_at IS NULL",
            quote_ident(&self.table)
        );
        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.error(op, e))?;
        row.map(|row| self.decode(op, row)).transpose()
    }

    async fn insert(&self, fields: Map<String, Value>) -> RepositoryResult<Record> {
        let op = RepositoryOperation::Insert;
        let values = self.known_fields(fields);
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} AS t",
            quote_ident(&self.table)
        ));

        if values.is_empty() {
            qb.push(" DEFAULT VALUES");
        } else {
            let names: Vec<String> = values.iter().map(|(n, _, _)| quote_ident(n)).collect();
            qb.push(format!(" ({}) VALUES (", names.join(", ")));
            for (i, (_, kind, value)) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push("CAST(");
                qb.push_bind(bind_text(value));
                qb.push(format!(" AS {})", sql_type(*kind)));
            }
            qb.push(")");
        }
        qb.push(" RETURNING to_jsonb(t)");

        let row: Value = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.error(op, e))?;
        self.decode(op, row)
    }

    async fn update(&self, id: i64, fields: Map<String, Value>) -> RepositoryResult<Option<Record>> {
        let op = RepositoryOperation::Update;
        let values = self.known_fields(fields);
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} AS t SET ",
            quote_ident(&self.table)
        ));
        for (name, kind, value) in &values {
            qb.push(format!("{} = CAST(", quote_ident(name)));
            qb.push_bind(bind_text(value));
            qb.push(format!(" AS {}), ", sql_type(*kind)));
        }
        qb.push("updated_at = now() WHERE t.id = ");
        qb.push_bind(id);
        qb.push(" AND t.deleted_at IS NULL RETURNING to_jsonb(t)");

        let row: Option<Value> = qb
            .build_query_scalar()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.error(op, e))?;
        row.map(|row| self.decode(op, row)).transpose()
    }

    async fn soft_delete(&self, id: i64) -> RepositoryResult<bool> {
        let sql = format!(
            "UPDATE {} SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
            quote_ident(&self.table)
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| self.error(RepositoryOperation::SoftDelete, e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("item_units"), "\"item_units\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("piece"), "piece");
    }

    #[test]
    fn test_bind_text() {
        assert_eq!(bind_text(&json!(null)), None);
        assert_eq!(bind_text(&json!("PC")).as_deref(), Some("PC"));
        assert_eq!(bind_text(&json!(12.5)).as_deref(), Some("12.5"));
        assert_eq!(bind_text(&json!(3)).as_deref(), Some("3"));
    }

    #[test]
    fn test_sql_type() {
        assert_eq!(sql_type(FieldKind::Text), "TEXT");
        assert_eq!(sql_type(FieldKind::Integer), "BIGINT");
        assert_eq!(sql_type(FieldKind::Number), "NUMERIC");
    }
}

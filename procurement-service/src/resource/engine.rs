//! Generic CRUD engine
//!
//! One [`ResourceEngine`] serves any resource: the descriptor supplies the
//! shape and the store supplies persistence. Bulk operations treat every
//! entry independently and never abort because of one bad entry; structural
//! problems (bad body, misaligned ids) are rejected before anything is
//! written.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::descriptor::ResourceDescriptor;
use super::error::{ResourceError, ResourceResult};
use super::outcome::{
    CreateOutcome, DeleteOutcome, ItemError, ReadOutcome, SkippedItem, UpdateOutcome,
};
use super::pagination::{Mode, Page, PageUrls};
use super::resolver::{search_filter, MutationTarget, ReadParams};
use crate::repository::{
    Filter, FilterCondition, FilterValue, OrderDirection, Pagination, Record, RecordStore,
    RESERVED_COLUMNS,
};

const ID_ORDER: Option<(&str, OrderDirection)> = Some(("id", OrderDirection::Ascending));

/// CRUD engine for one resource
#[derive(Debug, Clone)]
pub struct ResourceEngine<S> {
    descriptor: Arc<ResourceDescriptor>,
    store: S,
}

impl<S: RecordStore> ResourceEngine<S> {
    pub fn new(descriptor: ResourceDescriptor, store: S) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            store,
        }
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of active records
    pub async fn count_active(&self) -> ResourceResult<u64> {
        Ok(self.store.count_active(&[]).await?)
    }

    /// Read one record, a page, or a selection list
    ///
    /// `path` is the absolute collection URL used to build page links.
    pub async fn read(&self, params: &ReadParams, path: &str) -> ResourceResult<ReadOutcome> {
        let d = &self.descriptor;

        if let Some([id]) = params.ids.as_deref() {
            return match self.store.find_active_by_id(*id).await? {
                Some(record) => Ok(ReadOutcome::Single(record)),
                None => Err(ResourceError::not_found(format!(
                    "{} with ID {} not found.",
                    d.title(),
                    id
                ))),
            };
        }

        let mut filters = Vec::new();
        if let Some(ids) = &params.ids {
            filters.push(Filter::from(FilterCondition::in_ids(ids)));
        }
        if let Some(search) = search_filter(params.search.as_deref(), d) {
            filters.push(search);
        }

        match params.mode {
            Mode::Selection => {
                let records = self.store.find_active(&filters, ID_ORDER, None).await?;
                let fields: Vec<&str> = d.selection.to_vec();
                Ok(ReadOutcome::Selection(
                    records.iter().map(|r| r.project(&fields)).collect(),
                ))
            }
            Mode::Pagination => {
                let total = self.store.count_active(&filters).await?;
                let data = self
                    .store
                    .find_active(&filters, ID_ORDER, Some(params.page.pagination()))
                    .await?;
                let urls = PageUrls::new(path, params.page.per_page, params.search.as_deref());
                Ok(ReadOutcome::Page(Page::new(data, total, params.page, &urls)))
            }
        }
    }

    /// Insert one object, or every valid object of a collection array
    pub async fn create(&self, body: Value) -> ResourceResult<CreateOutcome> {
        let d = &self.descriptor;
        let Value::Object(mut object) = body else {
            return Err(ResourceError::validation(
                "Request body must be a JSON object.",
            ));
        };

        let Some(collection) = object.remove(d.collection_key) else {
            let fields = self
                .validate_create(&object)
                .map_err(ResourceError::Validation)?;
            if let Some(reason) = self.unique_clash(&fields, None, &HashSet::new()).await? {
                return Err(ResourceError::Validation(reason));
            }
            let record = self.store.insert(fields).await?;
            tracing::info!(resource = d.slug, id = record.id, "Record created");
            return Ok(CreateOutcome::Single(record));
        };

        let items = match collection {
            Value::Array(items) if !items.is_empty() => items,
            Value::Array(_) => {
                return Err(ResourceError::validation(format!(
                    "The '{}' array must contain at least one item.",
                    d.collection_key
                )))
            }
            _ => {
                return Err(ResourceError::validation(format!(
                    "The '{}' field must be an array.",
                    d.collection_key
                )))
            }
        };

        let mut created = Vec::new();
        let mut skipped = Vec::new();
        let mut batch_values: HashSet<(&'static str, String)> = HashSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let validated = match &item {
                Value::Object(map) => self.validate_create(map),
                _ => Err("Each item must be a JSON object.".to_string()),
            };
            let fields = match validated {
                Ok(fields) => fields,
                Err(reason) => {
                    skipped.push(SkippedItem {
                        index,
                        item,
                        reason,
                    });
                    continue;
                }
            };
            if let Some(reason) = self.unique_clash(&fields, None, &batch_values).await? {
                skipped.push(SkippedItem {
                    index,
                    item,
                    reason,
                });
                continue;
            }

            batch_values.extend(self.unique_values(&fields));
            created.push(self.store.insert(fields).await?);
        }

        tracing::info!(
            resource = d.slug,
            count = created.len(),
            skipped = skipped.len(),
            "Bulk insert completed"
        );
        Ok(CreateOutcome::Bulk { created, skipped })
    }

    /// Partially update one record, or several with positional bodies
    pub async fn update(&self, ids: Option<Vec<i64>>, body: Value) -> ResourceResult<UpdateOutcome> {
        let d = &self.descriptor;
        let ids = ids.ok_or_else(|| ResourceError::validation("The id parameter is required."))?;

        let Value::Object(mut object) = body else {
            return Err(ResourceError::validation(
                "Request body must be a JSON object.",
            ));
        };

        let (bodies, bulk) = match object.remove(d.collection_key) {
            Some(Value::Array(items)) => (items, true),
            Some(_) => {
                return Err(ResourceError::validation(format!(
                    "The '{}' field must be an array.",
                    d.collection_key
                )))
            }
            None if ids.len() > 1 => {
                return Err(ResourceError::validation(format!(
                    "Multiple IDs require a '{}' array in the request body.",
                    d.collection_key
                )))
            }
            None => (vec![Value::Object(object)], false),
        };

        if ids.len() != bodies.len() {
            return Err(ResourceError::CountMismatch {
                ids: ids.len(),
                bodies: bodies.len(),
            });
        }

        let mut patches = Vec::with_capacity(bodies.len());
        for body in bodies {
            let Value::Object(map) = body else {
                return Err(ResourceError::validation(
                    "Each update payload must be a JSON object.",
                ));
            };
            let patch = self.mutable_fields(map);
            if !patch.values().any(is_present) {
                return Err(ResourceError::EmptyUpdate);
            }
            patches.push(patch);
        }

        let mut updated = Vec::new();
        let mut errors = Vec::new();
        for (id, patch) in ids.into_iter().zip(patches) {
            match self.apply_update(id, patch).await? {
                Ok(record) => updated.push(record),
                Err(error) => errors.push(error),
            }
        }

        if !bulk {
            if let Some(error) = errors.pop() {
                return Err(if error.missing {
                    ResourceError::NotFound(error.message)
                } else {
                    ResourceError::Validation(error.message)
                });
            }
        }

        tracing::info!(
            resource = d.slug,
            count = updated.len(),
            failed = errors.len(),
            "Update completed"
        );
        Ok(UpdateOutcome::from_parts(updated, errors, bulk))
    }

    /// Soft delete by ids, or by a query that must match exactly one record
    pub async fn delete(&self, target: MutationTarget) -> ResourceResult<DeleteOutcome> {
        let d = &self.descriptor;
        match target {
            MutationTarget::Ids(ids) => {
                let mut deleted_ids = Vec::new();
                for id in ids {
                    if self.store.soft_delete(id).await? {
                        deleted_ids.push(id);
                    }
                }
                if deleted_ids.is_empty() {
                    return Err(ResourceError::not_found(format!(
                        "No active {} found for the given ID(s).",
                        d.plural
                    )));
                }
                let remaining_active = self.store.count_active(&[]).await?;
                tracing::info!(resource = d.slug, ids = ?deleted_ids, "Records soft deleted");
                Ok(DeleteOutcome::ById {
                    deleted_ids,
                    remaining_active,
                })
            }
            MutationTarget::Query(filters) => {
                let mut matches = self.store.find_active(&filters, ID_ORDER, None).await?;
                if matches.len() > 1 {
                    tracing::warn!(
                        resource = d.slug,
                        count = matches.len(),
                        "Query delete refused, multiple matches"
                    );
                    return Err(ResourceError::AmbiguousMatch {
                        message: format!(
                            "Multiple {} match the given query. Refine the query or delete by ID.",
                            d.plural
                        ),
                        candidates: matches,
                    });
                }
                let not_found = || {
                    ResourceError::not_found(format!("No {} matches the given query.", d.singular))
                };
                let record = matches.pop().ok_or_else(not_found)?;
                if !self.store.soft_delete(record.id).await? {
                    return Err(not_found());
                }
                let remaining_active = self.store.count_active(&[]).await?;
                tracing::info!(resource = d.slug, id = record.id, "Record soft deleted by query");
                Ok(DeleteOutcome::ByQuery {
                    deleted_id: record.id,
                    display_field: d.display_field,
                    display_value: record.get(d.display_field).unwrap_or(Value::Null),
                    remaining_active,
                })
            }
        }
    }

    /// Check and normalize a create payload; unknown keys are dropped
    fn validate_create(&self, object: &Map<String, Value>) -> Result<Map<String, Value>, String> {
        let mut fields = Map::new();
        for spec in &self.descriptor.fields {
            match object.get(spec.name) {
                None | Some(Value::Null) if spec.required_on_create => {
                    return Err(format!("The {} field is required.", spec.name));
                }
                None => {}
                Some(Value::Null) => {
                    fields.insert(spec.name.to_string(), Value::Null);
                }
                Some(value) => {
                    let value = spec.kind.coerce(value).ok_or_else(|| {
                        format!("The {} field must be {}.", spec.name, spec.kind.label())
                    })?;
                    if spec.required_on_create && !is_present(&value) {
                        return Err(format!("The {} field is required.", spec.name));
                    }
                    fields.insert(spec.name.to_string(), value);
                }
            }
        }
        Ok(fields)
    }

    /// Declared fields of an update body, reserved columns removed
    fn mutable_fields(&self, mut object: Map<String, Value>) -> Map<String, Value> {
        for column in RESERVED_COLUMNS {
            object.remove(column);
        }
        object
            .into_iter()
            .filter(|(key, _)| self.descriptor.field_spec(key).is_some())
            .collect()
    }

    /// Apply one patch; item-level problems come back as `Ok(Err(_))`
    async fn apply_update(
        &self,
        id: i64,
        patch: Map<String, Value>,
    ) -> ResourceResult<Result<Record, ItemError>> {
        let d = &self.descriptor;
        let missing = || ItemError {
            id,
            message: format!("{} with ID {} not found.", d.title(), id),
            missing: true,
        };
        let invalid = |message: String| ItemError {
            id,
            message,
            missing: false,
        };

        if self.store.find_active_by_id(id).await?.is_none() {
            return Ok(Err(missing()));
        }

        let mut fields = Map::new();
        for (name, value) in patch {
            let Some(spec) = d.field_spec(&name) else {
                continue;
            };
            let value = match value {
                Value::Null if spec.nullable => Value::Null,
                Value::Null => {
                    return Ok(Err(invalid(format!("The {} field cannot be null.", name))));
                }
                value => match spec.kind.coerce(&value) {
                    Some(value) => value,
                    None => {
                        return Ok(Err(invalid(format!(
                            "The {} field must be {}.",
                            name,
                            spec.kind.label()
                        ))));
                    }
                },
            };
            if spec.required_on_create && !is_present(&value) {
                return Ok(Err(invalid(format!("The {} field cannot be empty.", name))));
            }
            fields.insert(name, value);
        }

        if let Some(reason) = self.unique_clash(&fields, Some(id), &HashSet::new()).await? {
            return Ok(Err(invalid(reason)));
        }

        Ok(self.store.update(id, fields).await?.ok_or_else(missing))
    }

    /// Unique `(field, text)` pairs carried by `fields`
    fn unique_values(&self, fields: &Map<String, Value>) -> Vec<(&'static str, String)> {
        self.descriptor
            .unique
            .iter()
            .filter_map(|field| {
                let value = fields.get(*field)?;
                FilterValue::from_json(value)?
                    .as_text()
                    .map(|text| (*field, text))
            })
            .collect()
    }

    /// Reason the unique fields of `fields` are already taken, if they are
    ///
    /// Checks active records other than `exclude_id`, then values claimed
    /// earlier in the same batch.
    async fn unique_clash(
        &self,
        fields: &Map<String, Value>,
        exclude_id: Option<i64>,
        batch: &HashSet<(&'static str, String)>,
    ) -> ResourceResult<Option<String>> {
        for (field, text) in self.unique_values(fields) {
            let taken = |text: &str| format!("The {} '{}' has already been taken.", field, text);

            if batch.contains(&(field, text.clone())) {
                return Ok(Some(format!(
                    "Duplicate {} '{}' within the request.",
                    field, text
                )));
            }
            let filter = Filter::from(FilterCondition::eq(field, text.as_str()));
            let existing = self
                .store
                .find_active(&[filter], ID_ORDER, Some(Pagination::new(0, 2)))
                .await?;
            if existing.iter().any(|r| Some(r.id) != exclude_id) {
                return Ok(Some(taken(&text)));
            }
        }
        Ok(None)
    }
}

/// Non-null and, for strings, non-blank
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

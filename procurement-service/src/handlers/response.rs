//! Success envelopes for resource handlers
//!
//! Every body carries `message` and a `metadata` object listing the
//! available methods. Outcome-specific fields sit next to them.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::resource::{
    CreateOutcome, DeleteOutcome, Mode, ReadOutcome, ResourceDescriptor, UpdateOutcome,
    UpdateStatus,
};

/// Methods every resource endpoint accepts
pub const METHODS: &str = "[GET, POST, PUT, DELETE]";

/// JSON response with a status and the shared envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Map<String, Value>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("message".to_string(), Value::String(message.into()));
        body.insert("metadata".to_string(), json!({ "methods": METHODS }));
        Self { status, body }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message)
    }

    /// Set a top-level field
    #[must_use]
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.body.insert(key.to_string(), value);
        self
    }

    /// Set a field inside `metadata`
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        if let Some(Value::Object(metadata)) = self.body.get_mut("metadata") {
            metadata.insert(key.to_string(), value);
        }
        self
    }

    /// Build the body of a read
    ///
    /// `base_url` is the collection URL used for the example links of
    /// single reads.
    pub fn from_read(descriptor: &ResourceDescriptor, outcome: ReadOutcome, base_url: &str) -> Self {
        let mode = outcome.mode().map(Mode::as_str);
        match outcome {
            ReadOutcome::Single(record) => Self::ok(format!(
                "Successfully retrieved {} record.",
                descriptor.singular
            ))
            .with_field("data", json!(record))
            .with_metadata(
                "urls",
                json!([
                    format!("{}?id=[primary-key]", base_url),
                    format!("{}?page={{currentPage}}&per_page={{number_of_record_to_return}}", base_url),
                    format!("{}?page={{currentPage}}&per_page={{number_of_record_to_return}}&mode=selection", base_url),
                    format!("{}?page={{currentPage}}&per_page={{number_of_record_to_return}}&search=value", base_url),
                ]),
            ),
            ReadOutcome::Page(page) => Self::ok("Successfully retrieve all records.")
                .with_field("data", json!(page.data))
                .with_field("links", json!(page.links))
                .with_field("meta", json!(page.meta)),
            ReadOutcome::Selection(items) => Self::ok("Successfully retrieve all records.")
                .with_field("data", Value::Array(items))
                .with_metadata(
                    "content",
                    json!("This type of response is for selection component."),
                )
                .with_metadata("mode", json!(mode)),
        }
    }

    /// Build the body of a create
    ///
    /// A bulk create that inserted nothing answers 422.
    pub fn from_create(descriptor: &ResourceDescriptor, outcome: CreateOutcome) -> Self {
        let created_count = outcome.created_count();
        match outcome {
            CreateOutcome::Single(record) => Self::new(
                StatusCode::CREATED,
                format!("Successfully created {} record.", descriptor.singular),
            )
            .with_field("data", json!(record)),
            CreateOutcome::Bulk { created, skipped } => {
                let (status, message) = if created_count == 0 {
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        format!("No {} were created.", descriptor.plural),
                    )
                } else {
                    (
                        StatusCode::CREATED,
                        format!("Successfully created {} record", descriptor.plural),
                    )
                };
                let mut response = Self::new(status, message).with_field("data", json!(created));
                if !skipped.is_empty() {
                    response = response
                        .with_metadata("duplicate_items", json!(skipped))
                        .with_metadata(
                            "message",
                            json!(format!("{} item(s) were skipped.", skipped.len())),
                        );
                }
                response
            }
        }
    }

    /// Build the body of an update
    ///
    /// Mixed results answer 207; a failed bulk answers 404 when every id was
    /// missing and 422 otherwise.
    pub fn from_update(descriptor: &ResourceDescriptor, outcome: UpdateOutcome) -> Self {
        let all_missing = outcome.all_missing();
        let UpdateOutcome {
            status,
            updated,
            errors,
            bulk,
        } = outcome;

        match status {
            UpdateStatus::Success if !bulk => {
                let data = updated.into_iter().next().map(|r| json!(r)).unwrap_or(Value::Null);
                Self::ok(format!("{} updated successfully.", descriptor.title()))
                    .with_field("data", data)
            }
            UpdateStatus::Success => Self::ok(format!(
                "Successfully updated {} {}.",
                updated.len(),
                descriptor.plural
            ))
            .with_field("data", json!(updated)),
            UpdateStatus::PartialSuccess => Self::new(
                StatusCode::MULTI_STATUS,
                "Partial update completed with errors.",
            )
            .with_field("data", json!(updated))
            .with_field("errors", json!(errors)),
            UpdateStatus::Failed => {
                let code = if all_missing {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::UNPROCESSABLE_ENTITY
                };
                Self::new(code, format!("No {} were updated.", descriptor.plural))
                    .with_field("data", json!([]))
                    .with_field("errors", json!(errors))
            }
        }
    }

    /// Build the body of a soft delete
    pub fn from_delete(descriptor: &ResourceDescriptor, outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::ById {
                deleted_ids,
                remaining_active,
            } => Self::ok(format!(
                "Successfully deleted {} {}(s).",
                deleted_ids.len(),
                descriptor.singular
            ))
            .with_field("deleted_ids", json!(deleted_ids))
            .with_field("count", json!(deleted_ids.len()))
            .with_field("remaining_active", json!(remaining_active)),
            DeleteOutcome::ByQuery {
                deleted_id,
                display_field,
                display_value,
                remaining_active,
            } => Self::ok(format!("Successfully deleted {}.", descriptor.singular))
                .with_field("deleted_id", json!(deleted_id))
                .with_field(display_field, display_value)
                .with_field("remaining_active", json!(remaining_active)),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}

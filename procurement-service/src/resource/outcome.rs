//! Typed results of engine operations

use serde::Serialize;
use serde_json::Value;

use super::pagination::{Mode, Page};
use crate::repository::Record;

/// Result of a read
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    /// Exactly one id was requested
    Single(Record),
    /// Paginated collection
    Page(Page<Record>),
    /// Every match, projected to `id` plus the selection fields
    Selection(Vec<Value>),
}

impl ReadOutcome {
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Self::Single(_) => None,
            Self::Page(_) => Some(Mode::Pagination),
            Self::Selection(_) => Some(Mode::Selection),
        }
    }
}

/// A bulk-create entry that was not inserted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    /// Position in the submitted array
    pub index: usize,
    /// The submitted object, unchanged
    pub item: Value,
    pub reason: String,
}

/// Result of a create
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Single(Record),
    Bulk {
        created: Vec<Record>,
        skipped: Vec<SkippedItem>,
    },
}

impl CreateOutcome {
    pub fn created_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Bulk { created, .. } => created.len(),
        }
    }
}

/// Overall status of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Success,
    PartialSuccess,
    Failed,
}

/// Why one id of an update was not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub id: i64,
    pub message: String,
    /// No active record had this id
    #[serde(skip)]
    pub missing: bool,
}

/// Result of a single or bulk update
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub status: UpdateStatus,
    pub updated: Vec<Record>,
    pub errors: Vec<ItemError>,
    /// The body used the collection array form
    pub bulk: bool,
}

impl UpdateOutcome {
    pub(crate) fn from_parts(updated: Vec<Record>, errors: Vec<ItemError>, bulk: bool) -> Self {
        let status = match (updated.is_empty(), errors.is_empty()) {
            (_, true) => UpdateStatus::Success,
            (true, false) => UpdateStatus::Failed,
            (false, false) => UpdateStatus::PartialSuccess,
        };
        Self {
            status,
            updated,
            errors,
            bulk,
        }
    }

    /// Every failure was a missing record
    pub fn all_missing(&self) -> bool {
        !self.errors.is_empty() && self.errors.iter().all(|e| e.missing)
    }
}

/// Result of a soft delete
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    ById {
        deleted_ids: Vec<i64>,
        remaining_active: u64,
    },
    ByQuery {
        deleted_id: i64,
        display_field: &'static str,
        display_value: Value,
        remaining_active: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(id: i64, missing: bool) -> ItemError {
        ItemError {
            id,
            message: "x".to_string(),
            missing,
        }
    }

    fn record(id: i64) -> Record {
        Record::new(id, serde_json::Map::new())
    }

    #[test]
    fn test_read_mode_and_created_count() {
        assert_eq!(ReadOutcome::Single(record(1)).mode(), None);
        assert_eq!(
            ReadOutcome::Selection(vec![]).mode(),
            Some(Mode::Selection)
        );
        assert_eq!(CreateOutcome::Single(record(1)).created_count(), 1);
        let bulk = CreateOutcome::Bulk {
            created: vec![record(1), record(2)],
            skipped: vec![],
        };
        assert_eq!(bulk.created_count(), 2);
    }

    #[test]
    fn test_update_status() {
        assert_eq!(
            UpdateOutcome::from_parts(vec![record(1)], vec![], false).status,
            UpdateStatus::Success
        );
        assert_eq!(
            UpdateOutcome::from_parts(vec![record(1)], vec![error(2, true)], true).status,
            UpdateStatus::PartialSuccess
        );
        assert_eq!(
            UpdateOutcome::from_parts(vec![], vec![error(2, true)], true).status,
            UpdateStatus::Failed
        );
    }

    #[test]
    fn test_all_missing() {
        let outcome = UpdateOutcome::from_parts(vec![], vec![error(1, true), error(2, true)], true);
        assert!(outcome.all_missing());
        let outcome = UpdateOutcome::from_parts(vec![], vec![error(1, true), error(2, false)], true);
        assert!(!outcome.all_missing());
        assert!(!UpdateOutcome::from_parts(vec![record(1)], vec![], false).all_missing());
    }

    #[test]
    fn test_item_error_hides_missing_flag() {
        let value = serde_json::to_value(error(4, true)).unwrap();
        assert_eq!(value, serde_json::json!({"id": 4, "message": "x"}));
    }

    #[test]
    fn test_update_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(UpdateStatus::PartialSuccess).unwrap(),
            "partial_success"
        );
    }
}

//! Filtering, ordering and paging types for record queries
//!
//! Filters compare field values textually: `1`, `1.0` as text and `"1"` are
//! the same value for an equality match, which mirrors how query-string
//! input reaches the store.
//!
//! # Example
//!
//! ```rust
//! use procurement_service::repository::{Filter, FilterCondition, OrderDirection, Pagination};
//!
//! let filters = vec![
//!     Filter::from(FilterCondition::eq("code", "PC")),
//!     Filter::any_of(vec![
//!         FilterCondition::contains("name", "pie"),
//!         FilterCondition::contains("description", "pie"),
//!     ]),
//! ];
//! let order_by = Some(("id", OrderDirection::Ascending));
//! let page = Pagination::page(2, 10);
//! assert_eq!(page.offset, 10);
//! # let _ = (filters, order_by);
//! ```

use std::fmt;

use serde_json::Value;

use super::record::Record;

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order
    #[default]
    Ascending,
    /// Sort in descending order
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// Offset/limit window over a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    /// Create new pagination parameters
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Create pagination for a specific page number (1-indexed)
    ///
    /// ```rust
    /// use procurement_service::repository::Pagination;
    ///
    /// let page3 = Pagination::page(3, 20);
    /// assert_eq!(page3.offset, 40);
    /// assert_eq!(page3.limit, 20);
    /// assert_eq!(Pagination::page(u64::MAX, 20).offset, u64::MAX);
    /// ```
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        let offset = page_number.saturating_sub(1).saturating_mul(page_size);
        Self {
            offset,
            limit: page_size,
        }
    }
}

/// Comparison operators for filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Textual equality
    Equal,
    /// Case-insensitive substring match
    Contains,
    /// Value is one of a list
    In,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::Contains => write!(f, "ILIKE"),
            Self::In => write!(f, "IN"),
        }
    }
}

/// A value that can be used in filter conditions
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// List of integer values (for the IN operator)
    IntegerList(Vec<i64>),
    /// Null value
    Null,
}

impl FilterValue {
    /// Convert a JSON scalar into a filter value
    ///
    /// Arrays and objects have no filter representation and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Textual form used for comparisons; `None` for null and lists
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Integer(n) => Some(n.to_string()),
            Self::Float(n) => Some(n.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::IntegerList(_) | Self::Null => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(list: Vec<i64>) -> Self {
        Self::IntegerList(list)
    }
}

/// A single filter condition over one record field
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// The field name to filter on (`id` addresses the primary key)
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter (field = value)
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// Create a case-insensitive substring filter
    pub fn contains(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self::new(
            field,
            FilterOperator::Contains,
            FilterValue::String(term.into()),
        )
    }

    /// Restrict the primary key to the given ids
    pub fn in_ids(ids: &[i64]) -> Self {
        Self::new("id", FilterOperator::In, FilterValue::IntegerList(ids.to_vec()))
    }

    /// Evaluate this condition against a record
    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.field_text(&self.field);
        match self.operator {
            FilterOperator::Equal => match self.value.as_text() {
                Some(expected) => actual.as_deref() == Some(expected.as_str()),
                None => actual.is_none(),
            },
            FilterOperator::Contains => match (actual, self.value.as_text()) {
                (Some(actual), Some(term)) => {
                    actual.to_lowercase().contains(&term.to_lowercase())
                }
                _ => false,
            },
            FilterOperator::In => match &self.value {
                FilterValue::IntegerList(list) => actual
                    .as_deref()
                    .and_then(|text| text.parse::<i64>().ok())
                    .is_some_and(|n| list.contains(&n)),
                other => match (actual, other.as_text()) {
                    (Some(actual), Some(expected)) => actual == expected,
                    _ => false,
                },
            },
        }
    }
}

/// A predicate over records: one condition, or a disjunction of conditions
///
/// A slice of filters is a conjunction.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// A single condition that must hold
    Condition(FilterCondition),
    /// At least one of the conditions must hold; empty never matches
    AnyOf(Vec<FilterCondition>),
}

impl Filter {
    /// Build a disjunction
    pub fn any_of(conditions: Vec<FilterCondition>) -> Self {
        Self::AnyOf(conditions)
    }

    /// Evaluate this filter against a record
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Condition(condition) => condition.matches(record),
            Self::AnyOf(conditions) => conditions.iter().any(|c| c.matches(record)),
        }
    }
}

impl From<FilterCondition> for Filter {
    fn from(condition: FilterCondition) -> Self {
        Self::Condition(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Record {
        let fields = json!({"code": "PC", "name": "Piece", "item_unit_id": 3, "description": null});
        let Value::Object(fields) = fields else {
            panic!("object literal");
        };
        Record::new(7, fields)
    }

    #[test]
    fn test_order_direction_display() {
        assert_eq!(OrderDirection::Ascending.to_string(), "asc");
        assert_eq!(OrderDirection::Descending.to_string(), "desc");
        assert_eq!(OrderDirection::default(), OrderDirection::Ascending);
    }

    #[test]
    fn test_pagination_page_zero_saturates() {
        assert_eq!(Pagination::page(0, 10), Pagination::new(0, 10));
        assert_eq!(Pagination::page(1, 10).offset, 0);
    }

    #[test]
    fn test_pagination_offset_saturates() {
        let page = Pagination::page(u64::MAX, 10);
        assert_eq!(page.offset, u64::MAX);
        assert_eq!(page.limit, 10);
    }

    #[test]
    fn test_filter_value_from_json() {
        assert_eq!(FilterValue::from_json(&json!("a")), Some(FilterValue::from("a")));
        assert_eq!(FilterValue::from_json(&json!(3)), Some(FilterValue::Integer(3)));
        assert_eq!(FilterValue::from_json(&json!(2.5)), Some(FilterValue::Float(2.5)));
        assert_eq!(FilterValue::from_json(&json!(null)), Some(FilterValue::Null));
        assert_eq!(FilterValue::from_json(&json!([1])), None);
        assert_eq!(FilterValue::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_equal_is_textual() {
        let record = record();
        assert!(FilterCondition::eq("code", "PC").matches(&record));
        assert!(!FilterCondition::eq("code", "pc").matches(&record));
        assert!(FilterCondition::eq("item_unit_id", 3_i64).matches(&record));
        assert!(FilterCondition::eq("item_unit_id", "3").matches(&record));
        assert!(FilterCondition::eq("id", 7_i64).matches(&record));
    }

    #[test]
    fn test_equal_null_matches_missing_or_null() {
        let record = record();
        assert!(FilterCondition::eq("description", FilterValue::Null).matches(&record));
        assert!(FilterCondition::eq("absent", FilterValue::Null).matches(&record));
        assert!(!FilterCondition::eq("code", FilterValue::Null).matches(&record));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let record = record();
        assert!(FilterCondition::contains("name", "IEC").matches(&record));
        assert!(!FilterCondition::contains("name", "box").matches(&record));
        assert!(!FilterCondition::contains("description", "x").matches(&record));
    }

    #[test]
    fn test_in_ids() {
        let record = record();
        assert!(FilterCondition::in_ids(&[1, 7]).matches(&record));
        assert!(!FilterCondition::in_ids(&[1, 2]).matches(&record));
        assert!(!FilterCondition::in_ids(&[]).matches(&record));
    }

    #[test]
    fn test_any_of() {
        let record = record();
        let search = Filter::any_of(vec![
            FilterCondition::contains("code", "zz"),
            FilterCondition::contains("name", "pie"),
        ]);
        assert!(search.matches(&record));
        assert!(!Filter::any_of(vec![]).matches(&record));
    }
}

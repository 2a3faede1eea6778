//! Resource descriptors
//!
//! A [`ResourceDescriptor`] is the whole difference between two resources:
//! labels, accepted fields, search and selection columns, uniqueness rules.
//! The engine, the handlers and the stores are generic over it.

use serde_json::Value;

/// Value kind accepted for a descriptive field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any JSON string
    Text,
    /// Whole number; numeric strings are accepted and converted
    Integer,
    /// Any number; numeric strings are accepted and converted
    Number,
}

impl FieldKind {
    /// Check and normalize a non-null value for this kind
    ///
    /// ```rust
    /// use procurement_service::resource::FieldKind;
    /// use serde_json::json;
    ///
    /// assert_eq!(FieldKind::Integer.coerce(&json!("12")), Some(json!(12)));
    /// assert_eq!(FieldKind::Number.coerce(&json!(1.5)), Some(json!(1.5)));
    /// assert_eq!(FieldKind::Text.coerce(&json!(3)), None);
    /// ```
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Text, Value::String(_)) => Some(value.clone()),
            (Self::Integer, Value::Number(n)) if n.is_i64() => Some(value.clone()),
            (Self::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (Self::Number, Value::Number(_)) => Some(value.clone()),
            (Self::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number)),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::Integer => "an integer",
            Self::Number => "a number",
        }
    }
}

/// One descriptive field of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required_on_create: bool,
    pub nullable: bool,
}

impl FieldSpec {
    /// Optional, nullable field of the given kind
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required_on_create: false,
            nullable: true,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub const fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    /// Must be present and non-blank on create; implies non-nullable
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required_on_create = true;
        self.nullable = false;
        self
    }
}

/// Static description of one CRUD resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// URL segment, e.g. `item-units`
    pub slug: &'static str,
    /// Key holding the array in bulk bodies; also the table name
    pub collection_key: &'static str,
    pub singular: &'static str,
    pub plural: &'static str,
    /// Extra query keys accepted as the id parameter
    pub id_aliases: Vec<&'static str>,
    pub fields: Vec<FieldSpec>,
    pub searchable: Vec<&'static str>,
    pub selection: Vec<&'static str>,
    pub unique: Vec<&'static str>,
    pub display_field: &'static str,
}

impl ResourceDescriptor {
    /// Start a descriptor; add fields and rules with the builder methods
    ///
    /// ```rust
    /// use procurement_service::resource::{FieldSpec, ResourceDescriptor};
    ///
    /// let units = ResourceDescriptor::new("item-units", "item_units", "item unit", "item units")
    ///     .field(FieldSpec::text("name").required())
    ///     .field(FieldSpec::text("code").required())
    ///     .searchable(&["name", "code"])
    ///     .selection(&["name", "code"])
    ///     .unique(&["code"])
    ///     .display_field("name");
    ///
    /// assert!(units.field_spec("code").is_some());
    /// assert_eq!(units.id_keys(), vec!["id"]);
    /// ```
    pub fn new(
        slug: &'static str,
        collection_key: &'static str,
        singular: &'static str,
        plural: &'static str,
    ) -> Self {
        Self {
            slug,
            collection_key,
            singular,
            plural,
            id_aliases: Vec::new(),
            fields: Vec::new(),
            searchable: Vec::new(),
            selection: Vec::new(),
            unique: Vec::new(),
            display_field: "id",
        }
    }

    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    #[must_use]
    pub fn id_alias(mut self, alias: &'static str) -> Self {
        self.id_aliases.push(alias);
        self
    }

    #[must_use]
    pub fn searchable(mut self, fields: &[&'static str]) -> Self {
        self.searchable = fields.to_vec();
        self
    }

    #[must_use]
    pub fn selection(mut self, fields: &[&'static str]) -> Self {
        self.selection = fields.to_vec();
        self
    }

    #[must_use]
    pub fn unique(mut self, fields: &[&'static str]) -> Self {
        self.unique = fields.to_vec();
        self
    }

    #[must_use]
    pub fn display_field(mut self, field: &'static str) -> Self {
        self.display_field = field;
        self
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Query keys accepted as the id parameter, `id` first
    pub fn id_keys(&self) -> Vec<&'static str> {
        std::iter::once("id")
            .chain(self.id_aliases.iter().copied())
            .collect()
    }

    /// Singular label with the first letter upper-cased
    pub fn title(&self) -> String {
        let mut chars = self.singular.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_coercion() {
        assert_eq!(FieldKind::Integer.coerce(&json!(4)), Some(json!(4)));
        assert_eq!(FieldKind::Integer.coerce(&json!(" 4 ")), Some(json!(4)));
        assert_eq!(FieldKind::Integer.coerce(&json!(4.5)), None);
        assert_eq!(FieldKind::Integer.coerce(&json!("four")), None);
        assert_eq!(FieldKind::Integer.coerce(&json!(true)), None);
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(FieldKind::Number.coerce(&json!(4)), Some(json!(4)));
        assert_eq!(FieldKind::Number.coerce(&json!("2.25")), Some(json!(2.25)));
        assert_eq!(FieldKind::Number.coerce(&json!("NaN")), None);
        assert_eq!(FieldKind::Number.coerce(&json!([1])), None);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(FieldKind::Text.coerce(&json!("x")), Some(json!("x")));
        assert_eq!(FieldKind::Text.coerce(&json!(1)), None);
    }

    #[test]
    fn test_required_is_not_nullable() {
        let spec = FieldSpec::text("code").required();
        assert!(spec.required_on_create);
        assert!(!spec.nullable);
        assert!(FieldSpec::number("budget").nullable);
    }

    #[test]
    fn test_id_keys_and_title() {
        let types = ResourceDescriptor::new(
            "purchase-types",
            "purchase_types",
            "purchase type",
            "purchase types",
        )
        .id_alias("purchase_type_id");
        assert_eq!(types.id_keys(), vec!["id", "purchase_type_id"]);
        assert_eq!(types.title(), "Purchase type");
    }
}

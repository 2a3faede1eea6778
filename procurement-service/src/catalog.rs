//! Built-in resources

use crate::resource::{FieldSpec, ResourceDescriptor};

pub fn item_units() -> ResourceDescriptor {
    ResourceDescriptor::new("item-units", "item_units", "item unit", "item units")
        .field(FieldSpec::text("name").required())
        .field(FieldSpec::text("code").required())
        .field(FieldSpec::text("description"))
        .searchable(&["name", "code", "description"])
        .selection(&["name", "code"])
        .unique(&["code"])
        .display_field("name")
}

pub fn purchase_types() -> ResourceDescriptor {
    ResourceDescriptor::new(
        "purchase-types",
        "purchase_types",
        "purchase type",
        "purchase types",
    )
    .id_alias("purchase_type_id")
    .field(FieldSpec::text("code").required())
    .field(FieldSpec::text("description").required())
    .searchable(&["code", "description"])
    .selection(&["code", "description"])
    .unique(&["code"])
    .display_field("code")
}

pub fn items() -> ResourceDescriptor {
    ResourceDescriptor::new("items", "items", "item", "items")
        .field(FieldSpec::integer("item_unit_id").required())
        .field(FieldSpec::integer("item_category_id").required())
        .field(FieldSpec::integer("item_classification_id").required())
        .field(FieldSpec::text("name").required())
        .field(FieldSpec::number("estimated_budget"))
        .searchable(&["name"])
        .selection(&["name", "estimated_budget"])
        .display_field("name")
}

pub fn objectives() -> ResourceDescriptor {
    ResourceDescriptor::new("objectives", "objectives", "objective", "objectives")
        .field(FieldSpec::text("objective_uuid"))
        .field(FieldSpec::text("code").required())
        .field(FieldSpec::text("description").required())
        .searchable(&["code", "description"])
        .selection(&["code", "description"])
        .unique(&["code"])
        .display_field("code")
}

pub fn item_categories() -> ResourceDescriptor {
    ResourceDescriptor::new(
        "item-categories",
        "item_categories",
        "item category",
        "item categories",
    )
    .field(FieldSpec::text("name").required())
    .field(FieldSpec::text("code").required())
    .field(FieldSpec::text("description"))
    .searchable(&["name", "code", "description"])
    .selection(&["name", "code"])
    .unique(&["code"])
    .display_field("name")
}

pub fn procurement_modes() -> ResourceDescriptor {
    ResourceDescriptor::new(
        "procurement-modes",
        "procurement_modes",
        "procurement mode",
        "procurement modes",
    )
    .field(FieldSpec::text("name").required())
    .searchable(&["name"])
    .selection(&["name"])
    .unique(&["name"])
    .display_field("name")
}

/// Every built-in resource, in mount order
pub fn all() -> Vec<ResourceDescriptor> {
    vec![
        item_units(),
        purchase_types(),
        items(),
        objectives(),
        item_categories(),
        procurement_modes(),
    ]
}

/// Built-in resources filtered by slug; an empty list selects all
///
/// Slugs that match no built-in resource are logged and skipped.
pub fn enabled(slugs: &[String]) -> Vec<ResourceDescriptor> {
    let all = all();
    for slug in unknown_slugs(slugs, &all) {
        tracing::warn!(slug, "Unknown resource in resources.enabled, ignoring");
    }
    all.into_iter()
        .filter(|d| slugs.is_empty() || slugs.iter().any(|s| s == d.slug))
        .collect()
}

fn unknown_slugs<'a>(slugs: &'a [String], all: &[ResourceDescriptor]) -> Vec<&'a str> {
    slugs
        .iter()
        .map(String::as_str)
        .filter(|slug| !all.iter().any(|d| d.slug == *slug))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRecordStore;
    use crate::resource::{CreateOutcome, ResourceEngine};
    use serde_json::{json, Value};
    use std::collections::HashSet;

    #[test]
    fn test_slugs_and_tables_are_unique() {
        let all = all();
        let slugs: HashSet<_> = all.iter().map(|d| d.slug).collect();
        let tables: HashSet<_> = all.iter().map(|d| d.collection_key).collect();
        assert_eq!(slugs.len(), all.len());
        assert_eq!(tables.len(), all.len());
    }

    #[test]
    fn test_descriptor_fields_are_consistent() {
        for d in all() {
            for name in d.searchable.iter().chain(&d.selection).chain(&d.unique) {
                assert!(d.field_spec(name).is_some(), "{}: unknown field {}", d.slug, name);
            }
            assert!(
                d.display_field == "id" || d.field_spec(d.display_field).is_some(),
                "{}: bad display field",
                d.slug
            );
        }
    }

    #[test]
    fn test_enabled_filters_by_slug() {
        assert_eq!(enabled(&[]).len(), all().len());
        let only = enabled(&["items".to_string(), "nope".to_string()]);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].slug, "items");
    }

    #[test]
    fn test_unknown_slugs_are_reported() {
        let slugs = vec![
            "items".to_string(),
            "item-unit".to_string(),
            "vendors".to_string(),
        ];
        assert_eq!(unknown_slugs(&slugs, &all()), vec!["item-unit", "vendors"]);
        assert!(unknown_slugs(&[], &all()).is_empty());
    }

    #[tokio::test]
    async fn test_objective_keeps_uuid() {
        let engine = ResourceEngine::new(objectives(), MemoryRecordStore::new());
        let CreateOutcome::Single(record) = engine
            .create(json!({
                "objective_uuid": "0b6f2d3e-5c1a-4f7e-9a8b-2c4d6e8f0a1b",
                "code": "OBJ-1",
                "description": "Reduce stock-outs"
            }))
            .await
            .unwrap()
        else {
            panic!("expected single create");
        };
        assert_eq!(
            record.fields["objective_uuid"],
            "0b6f2d3e-5c1a-4f7e-9a8b-2c4d6e8f0a1b"
        );

        let CreateOutcome::Single(without) = engine
            .create(json!({"code": "OBJ-2", "description": "Shorten lead times"}))
            .await
            .unwrap()
        else {
            panic!("expected single create");
        };
        assert!(without.fields.get("objective_uuid").map_or(true, Value::is_null));
    }
}
